use std::cell::RefCell;
use std::rc::Rc;

use recorder::StateLogger;

mod sim;
use sim::SimulatedEkf;

/// Number of simulated epochs to record (10 s at 250 Hz)
const EPOCHS: u32 = 2500;

/// Epoch at which the simulated GPS acquires a fix
const FIX_EPOCH: u32 = 250;

/// Satellite count reported once the fix is acquired
const FIX_SAT_COUNT: i32 = 12;

const STATE_FILE: &str = "ekf_state.csv";
const PARAMS_FILE: &str = "ekf_params.txt";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let ekf = Rc::new(RefCell::new(SimulatedEkf::new()));
    let mut logger = StateLogger::new(Rc::clone(&ekf));
    logger.set_file_path(STATE_FILE);
    logger.set_status_label("sat_count");

    log::info!("recording {} epochs to {}", EPOCHS, STATE_FILE);

    for epoch in 0..EPOCHS {
        ekf.borrow_mut().step();

        // The status column carries the satellite count. Zero (not the
        // negative sentinel) before the fix, so the column exists from
        // the first row on.
        let sat_count = if epoch >= FIX_EPOCH { FIX_SAT_COUNT } else { 0 };

        if let Err(err) = logger.record_epoch(sat_count) {
            // A hole in the run log invalidates the whole run; stop
            // immediately rather than continue without data.
            log::error!("{}", err);
            std::process::exit(1);
        }

        if epoch == FIX_EPOCH {
            log::debug!("simulated GPS fix at epoch {}", epoch);
        }
    }

    std::fs::write(PARAMS_FILE, logger.dump_parameters())?;
    log::info!("wrote tuning-parameter report to {}", PARAMS_FILE);

    Ok(())
}
