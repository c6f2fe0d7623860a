//! Resolve command: walk every configured chain once and show the result.

use std::path::Path;

use anyhow::Result;
use skyhook::{MemoryAccess, PointerChain, load_game_config, open_process};

pub fn run(config_path: &Path) -> Result<()> {
    let config = load_game_config(config_path)?;
    let target = open_process(&config.process_name)?;

    println!("=== {} ===", config.process_name);

    let [x, y, z] = config.position.axis_chains();
    print_chain(&target, "x", &x);
    print_chain(&target, "y", &y);
    print_chain(&target, "z", &z);

    if let Some([sx, sy, sz]) = config.position.shadow_chains() {
        print_chain(&target, "shadow x", &sx);
        print_chain(&target, "shadow y", &sy);
        print_chain(&target, "shadow z", &sz);
    }

    if let Some(orientation) = &config.orientation {
        print_chain(&target, "sin", &orientation.sin);
        print_chain(&target, "cos", &orientation.cos);
    }

    Ok(())
}

fn print_chain<A: MemoryAccess>(target: &A, label: &str, chain: &PointerChain) {
    let module = if chain.module().is_empty() {
        "<main>"
    } else {
        chain.module()
    };
    match chain.resolve(target) {
        Ok(addr) => {
            let value = target
                .read_f32(addr)
                .map(|v| format!("{v:.3}"))
                .unwrap_or_else(|_| "<unreadable>".into());
            println!(
                "  {label:<9} {module}+{:<24} -> {addr:#x} = {value}",
                chain.to_chain_text()
            );
        }
        Err(e) => println!(
            "  {label:<9} {module}+{:<24} -> {e}",
            chain.to_chain_text()
        ),
    }
}
