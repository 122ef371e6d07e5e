//! Pool of expensive "connections" capped at three live instances, evicted
//! least-recently-released first.

use cachedfactory::prelude::*;

#[derive(Debug)]
struct Connection {
    host: &'static str,
    port: u16,
    queries: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut pool: CachedFactory<&str, (u16,), Connection, _, _, _> = CachedFactory::with_policies(
        AmountLimitedCreation::try_new(3)?,
        EvictLru::new(),
        SimpleStatistics::new(),
    );
    for host in ["alpha", "beta", "gamma", "delta"] {
        pool.register(host, move |(port,)| Connection {
            host,
            port,
            queries: 0,
        });
    }

    for round in 0..3 {
        for host in ["alpha", "beta", "gamma"] {
            let conn = pool.create_object(host, (5432,))?;
            if let Some(conn) = pool.get_mut(&conn) {
                conn.queries += 1;
            }
            println!("round {round}: {:?}", pool.get(&conn));
            pool.release_object(conn)?;
        }
    }

    // a fourth host needs room: the least-released connection goes
    let delta = pool.create_object("delta", (5432,))?;
    if let Some(conn) = pool.get(&delta) {
        println!("{}:{} after {} queries", conn.host, conn.port, conn.queries);
    }
    pool.release_object(delta)?;

    print!("{}", pool.report());
    Ok(())
}
