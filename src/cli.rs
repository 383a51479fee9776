//! CLI for the commandeer demo driver.

use clap::Parser;

/// Simulated robot program driving a commandeer scheduler.
#[derive(Debug, Parser)]
#[command(name = "commandeer", version, about)]
pub struct Cli {
    /// Control-loop period in milliseconds
    #[arg(long, default_value_t = 20)]
    pub period_ms: u64,

    /// Number of ticks to run before exiting
    #[arg(long, default_value_t = 50)]
    pub ticks: u64,

    /// Tick at which the operator "presses the button" that schedules the
    /// arm-raise command
    #[arg(long, default_value_t = 10)]
    pub button_tick: u64,

    /// Tick at which the driver station disables the robot (0 = never)
    #[arg(long, default_value_t = 40)]
    pub disable_tick: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["commandeer"]);
        assert_eq!(cli.period_ms, 20);
        assert_eq!(cli.ticks, 50);
        assert_eq!(cli.button_tick, 10);
        assert_eq!(cli.disable_tick, 40);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["commandeer", "--period-ms", "5", "--ticks", "3", "-v"]);
        assert_eq!(cli.period_ms, 5);
        assert_eq!(cli.ticks, 3);
        assert!(cli.verbose);
    }
}
