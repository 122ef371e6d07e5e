//! Choosing policies at run time from command-line arguments.
//!
//! ```text
//! cargo run --example builder -- aging 2
//! ```

use std::env;

use cachedfactory::builder::{CachedFactoryBuilder, CreationConfig, EvictionConfig};
use cachedfactory::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut args = env::args().skip(1);
    let eviction = match args.next().as_deref() {
        Some("lru") => EvictionConfig::Lru,
        Some("aging") => EvictionConfig::Aging,
        _ => EvictionConfig::Random { seed: None },
    };
    let max_live = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(4);

    let mut cache = CachedFactoryBuilder::new()
        .creation(CreationConfig::AmountLimited { max_live })
        .eviction(eviction)
        .statistics(true)
        .try_build::<char, (usize,), String>()?;
    for letter in 'a'..='f' {
        cache.register(letter, move |(n,)| letter.to_string().repeat(n));
    }

    for (i, letter) in "abcabdabefab".chars().enumerate() {
        match cache.create_object(letter, (i % 3 + 1,)) {
            Ok(handle) => {
                println!("{letter}: {:?}", cache.get(&handle));
                cache.release_object(handle)?;
            },
            Err(err) => println!("{letter}: {err}"),
        }
    }

    print!("{}", cache.report());
    Ok(())
}
