use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::{signal, task};

use taskpool::{Outcome, Pool, PoolConfig};

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "double every value on a pool of worker threads")]
    Run {
        #[arg(short, long, default_value_t = 2)]
        workers: usize,

        #[arg(long, help = "values whose task fails instead of doubling")]
        fail_on: Vec<i64>,

        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        #[arg(short, long, help = "log worker lifecycle at debug level")]
        quiet: bool,

        #[arg(allow_negative_numbers = true)]
        values: Vec<i64>,
    },
    #[command(about = "print the version")]
    Version {},
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            workers,
            fail_on,
            delay_ms,
            quiet,
            values,
        } => {
            let function = doubler(fail_on, Duration::from_millis(delay_ms));
            let config = PoolConfig::default().verbose(!quiet);
            run(Pool::uniform(workers, function, config)?, values).await
        }
        Commands::Version {} => {
            let version = env!("CARGO_PKG_VERSION");
            println!("taskpool version {:}", version);
            Ok(())
        }
    }
}

fn doubler(
    fail_on: Vec<i64>,
    delay: Duration,
) -> impl FnMut(i64) -> Result<i64> + Clone + Send + 'static {
    move |x| {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        if fail_on.contains(&x) {
            return Err(anyhow!("refusing to double {}", x));
        }
        x.checked_mul(2).ok_or(anyhow!("doubling {} overflows", x))
    }
}

async fn run(pool: Pool<i64, i64>, values: Vec<i64>) -> Result<()> {
    let pool = Arc::new(pool);

    let batch = pool.clone();
    let mut work = task::spawn_blocking(move || {
        let (mut succeeded, mut failed) = (0usize, 0usize);
        for outcome in batch.execute(values) {
            match outcome {
                Outcome::Success(value) => {
                    succeeded += 1;
                    println!("ok {}", value);
                }
                Outcome::Failure(e) => {
                    failed += 1;
                    println!("err {:#}", e);
                }
            }
        }
        (succeeded, failed)
    });

    let (succeeded, failed) = tokio::select! {
        counts = &mut work => counts?,
        Ok(()) = signal::ctrl_c() => {
            log::warn!("interrupted, stopping workers");
            pool.interrupter().interrupt();
            pool.stop();
            let stopping = pool.clone();
            task::spawn_blocking(move || stopping.join()).await?;
            work.await?
        }
    };
    println!("{} succeeded, {} failed", succeeded, failed);

    // dropping the last handle joins the workers, keep that off the runtime threads
    task::spawn_blocking(move || drop(pool)).await?;
    Ok(())
}
