use clap::Subcommand;
use rounds_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a single value by dot-separated key
    Get {
        /// Key such as audio.enabled or timer.tick_interval_ms
        key: String,
    },
    /// Set a value and persist the config
    Set { key: String, value: String },
    /// Print the whole configuration
    List,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
