//! `debie tools`: List agent tools or call one directly.

use debie_core::tool::ToolCall;
use debie_gateway::bootstrap;

pub async fn run(name: Option<String>, args: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let runtime = bootstrap::build_runtime(&config).await?;

    let Some(name) = name else {
        println!("Agent tools ({})", runtime.tools.len());
        for def in runtime.tools.definitions() {
            println!("  {:<30} {}", def.name, def.description);
        }
        return Ok(());
    };

    let arguments: serde_json::Value =
        serde_json::from_str(args).map_err(|e| format!("--args is not valid JSON: {e}"))?;
    let call = ToolCall {
        id: "cli".into(),
        name,
        arguments,
    };
    let result = runtime.tools.execute(&call).await?;
    println!("{}", result.output);
    if !result.success {
        return Err(format!("{} reported an error", call.name).into());
    }
    Ok(())
}
