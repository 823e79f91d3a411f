pub mod bookings;
pub mod chat;
pub mod doctor;
pub mod kb;

use anyhow::Result;

use restobot::config::RestobotConfig;
use restobot::server;

/// Print every tool's name, description and input schema.
pub fn tools(config: &RestobotConfig) -> Result<()> {
    let (_db, tools) = server::open_tools(config)?;
    let registry = tools.registry();

    println!("{} tools", registry.len());
    for spec in registry.specs() {
        println!();
        println!("{}", spec.name);
        println!("{}", "-".repeat(spec.name.len()));
        println!("{}", spec.description);
        println!("{}", serde_json::to_string_pretty(&spec.input_schema)?);
    }
    Ok(())
}
