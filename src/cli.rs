use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Pair identifier; also selects the key counterbalancing
    #[arg(value_name = "PAIR_ID")]
    pub pair_id: u32,

    /// Chamber this participant sits in (1 or 2)
    #[arg(long, default_value_t = 1)]
    pub chamber: u8,

    /// Path to config TOML
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    /// Data directory for session records (overrides config)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Trials per titration pass (overrides config)
    #[arg(long)]
    pub trials: Option<usize>,

    /// Seed for schedules and simulated observers (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// True threshold of the simulated observer
    #[arg(long, default_value_t = 0.3)]
    pub threshold: f64,

    /// Run fully simulated: no key prompts, no sufficiency question
    #[arg(long, default_value_t = false)]
    pub auto: bool,
}
