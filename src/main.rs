use std::thread;

use mlog::{log_debug, log_error, log_info, Level, Logger};

fn main() -> mlog::Result<()> {
    let mut logger = Logger::init(Level::Info, "mlog_demo.log", 1 << 20)?;

    thread::scope(|scope| {
        for worker in 0..4 {
            let logger = &logger;
            scope.spawn(move || {
                for i in 0..100 {
                    log_info!(logger, "worker {} tick {}", worker, i);
                }
            });
        }
    });

    log_debug!(logger, "filtered out at info level");
    log_error!(logger, "demo finished, {} records dropped", logger.dropped());
    logger.shutdown();
    Ok(())
}
