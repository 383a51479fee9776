use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::Result;
use log::info;

mod cli;

use cli::Cli;
use commandeer::{Command, FunctionalCommand, Scheduler, Subsystem};

struct Drivetrain {
    ticks: u32,
}

impl Subsystem for Drivetrain {
    fn name(&self) -> &str {
        "drivetrain"
    }

    fn periodic(&mut self) {
        self.ticks += 1;
        log::trace!("drivetrain periodic, tick {}", self.ticks);
    }
}

struct Arm;

impl Subsystem for Arm {
    fn name(&self) -> &str {
        "arm"
    }
}

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env().init();
    info!("Logging initialized");
    Ok(())
}

fn main() -> Result<()> {
    setup_logging()?;
    let cli = Cli::parse();

    info!("Starting demo driver: {:?}", cli);

    let mut scheduler = Scheduler::new();
    let tick = Rc::new(Cell::new(0u64));

    let drive = scheduler.register_subsystem(Box::new(Drivetrain { ticks: 0 }));
    let arm = scheduler.register_subsystem(Box::new(Arm));

    // Default teleop drive: holds the drivetrain whenever nothing else does.
    let teleop = scheduler.register_command(Box::new(FunctionalCommand::run_forever(
        "teleop-drive",
        vec![drive],
        |_| {},
    )));
    scheduler.set_default_command(drive, teleop)?;

    // Arm raise finishes after ten ticks of simulated motion.
    let raise_progress = Rc::new(Cell::new(0u32));
    let progress = raise_progress.clone();
    let finished = raise_progress.clone();
    let raise = scheduler.register_command(Box::new(
        FunctionalCommand::new("raise-arm", vec![arm])
            .with_initialize(move |_| progress.set(0))
            .with_execute({
                let progress = raise_progress.clone();
                move |_| progress.set(progress.get() + 1)
            })
            .with_finished(move || finished.get() >= 10),
    ));

    // Operator button on a rising edge at the configured tick.
    let button_tick = cli.button_tick;
    let button = tick.clone();
    scheduler.bind(
        move || button.get() == button_tick,
        move |scheduler| {
            scheduler.schedule(raise);
        },
    );

    scheduler.on_command_initialize(|_, command: &dyn Command| {
        println!("{} {}", "started:".green(), command.name());
    });
    scheduler.on_command_finish(|_, command: &dyn Command| {
        println!("{} {}", "finished:".cyan(), command.name());
    });
    scheduler.on_command_interrupt(|_, command: &dyn Command| {
        println!("{} {}", "interrupted:".yellow(), command.name());
    });

    let period = Duration::from_millis(cli.period_ms);
    for n in 0..cli.ticks {
        tick.set(n);
        if cli.disable_tick != 0 && n == cli.disable_tick {
            println!("{}", "driver station: disabled".red());
            scheduler.set_enabled(false);
        }
        scheduler.run()?;
        if cli.verbose {
            println!("tick {n}: {} live command(s)", scheduler.live_commands().len());
        }
        std::thread::sleep(period);
    }

    info!("Demo driver finished after {} ticks", cli.ticks);
    Ok(())
}
