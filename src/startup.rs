// Startup module - displays banner and module loading status
//
// Runs before the TUI takes over the screen (or in headless mode), then
// repeats the summary into the logs panel so it is visible in-app too.

use crate::config::{Config, Features, VERSION};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// Module loading result for display
pub struct ModuleStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub description: &'static str,
}

/// Print the startup banner and module loading status
pub fn print_startup(config: &Config) {
    use colors::*;

    // Banner
    println!();
    println!("  {BOLD}{CYAN}agora{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}Terminal client for the Agora civic engagement platform{RESET}");
    println!();

    // Config file status
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}✓{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!();

    // Module loading
    println!("  {DIM}Loading modules...{RESET}");

    let modules = get_module_status(config);
    for module in &modules {
        print_module_status(module);
    }

    println!();

    // Backend info
    println!(
        "  {MAGENTA}▸{RESET} Backend {BOLD}{}{RESET}",
        config.api_url
    );
    if config.demo_mode {
        println!("  {YELLOW}▸{RESET} {YELLOW}Demo mode active{RESET} {DIM}(synthetic events){RESET}");
    }
    println!();
}

/// Get status of all modules based on config
fn get_module_status(config: &Config) -> Vec<ModuleStatus> {
    let Features {
        activity_feed,
        blogs,
        milestones,
        verification,
    } = &config.features;

    vec![
        ModuleStatus {
            name: "api",
            enabled: true, // Core, always on
            description: "REST client",
        },
        ModuleStatus {
            name: "timeline",
            enabled: true, // Core, always on
            description: "Lineage paging",
        },
        ModuleStatus {
            name: "tui",
            enabled: config.enable_tui,
            description: "Terminal interface",
        },
        ModuleStatus {
            name: "feed",
            enabled: *activity_feed,
            description: "Live activity socket",
        },
        ModuleStatus {
            name: "blogs",
            enabled: *blogs,
            description: "Blog panels",
        },
        ModuleStatus {
            name: "milestones",
            enabled: *milestones,
            description: "Milestones panel",
        },
        ModuleStatus {
            name: "verify",
            enabled: *verification,
            description: "Verification watcher",
        },
    ]
}

/// Print a single module's status
fn print_module_status(module: &ModuleStatus) {
    use colors::*;

    let (icon, style) = if module.enabled {
        (format!("{GREEN}✓{RESET}"), "")
    } else {
        (format!("{DIM}○{RESET}"), DIM)
    };

    println!(
        "    {icon} {style}{:<12}{RESET} {DIM}{}{RESET}",
        module.name, module.description
    );
}

/// Repeat the boot summary into the TUI log panel
pub fn log_startup(config: &Config) {
    tracing::info!("agora v{} starting", VERSION);

    let modules = get_module_status(config);
    for module in &modules {
        let icon = if module.enabled { "✓" } else { "○" };
        tracing::info!("  {} {} - {}", icon, module.name, module.description);
    }

    tracing::info!("▸ Backend {}", config.api_url);

    if config.demo_mode {
        tracing::info!("▸ Demo mode active (synthetic events)");
    }

    tracing::info!("Ready.");
}
