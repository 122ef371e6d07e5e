//! Rate-limited construction: bursts beyond the configured rate fail until
//! the window slides.

use std::thread;
use std::time::Duration;

use cachedfactory::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let window = Duration::from_millis(200);
    let mut cache: CachedFactory<&str, (u32,), String, _, _, _> = CachedFactory::with_policies(
        RateLimitedCreation::try_new(3, window)?,
        EvictRandom::new(),
        SimpleStatistics::new(),
    );
    cache.register("report", |(page,)| format!("report page {page}"));

    let mut out = Vec::new();
    for page in 0..8 {
        match cache.create_object("report", (page,)) {
            Ok(handle) => {
                println!("built {:?}", cache.get(&handle));
                out.push(handle);
            },
            Err(err @ CacheError::CreationRateExceeded { .. }) => {
                println!("page {page}: {err}; waiting {} ms", window.as_millis());
                thread::sleep(window);
            },
            Err(err) => return Err(err.into()),
        }
    }
    for handle in out {
        cache.release_object(handle)?;
    }

    // reconfigure at run time
    cache
        .creation_policy_mut()
        .set_rate(100, Duration::from_secs(1))?;
    let handle = cache.create_object("report", (99,))?;
    println!("after raising the rate: {:?}", cache.get(&handle));
    cache.release_object(handle)?;

    print!("{}", cache.report());
    Ok(())
}
