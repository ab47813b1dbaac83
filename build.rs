use std::env;
use std::path::Path;

/// Deployment settings baked into the firmware, with the fallback used when
/// neither the environment nor `.env` provides a value.
const SETTINGS: &[(&str, &str)] = &[
    ("WIFI_SSID", ""),
    ("WIFI_PASSWORD", ""),
    ("SIGN_SERVER_URL", "http://10.10.50.101:3000"),
    ("SIGN_ID", "1"),
    ("SIGN_PATTERN", "right-arrow-v2"),
];

fn main() {
    load_env_config();

    // Host builds (unit tests) link normally; only the ESP32-C3 image needs
    // the esp-hal linker scripts.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("riscv32") {
        linker_be_nice();
        // make sure linkall.x is the last linker script (otherwise might cause problems with flip-link)
        println!("cargo:rustc-link-arg=-Tlinkall.x");
    }
}

/// Load sign configuration from the .env file
/// Environment variables take priority over .env file values
fn load_env_config() {
    println!("cargo:rerun-if-changed=.env");
    for (name, _) in SETTINGS {
        println!("cargo:rerun-if-env-changed={}", name);
    }

    if Path::new(".env").exists() {
        match dotenvy::dotenv() {
            Ok(_) => println!("cargo:warning=Loaded .env file"),
            Err(e) => println!("cargo:warning=Failed to load .env file: {}", e),
        }
    }

    for (name, fallback) in SETTINGS {
        // Empty values count as unset
        let value = env::var(name)
            .map(|v| v.trim().to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string());

        println!("cargo:rustc-env={}={}", name, value);
    }

    if env::var("WIFI_SSID").map(|v| v.trim().is_empty()).unwrap_or(true) {
        println!("cargo:warning=WIFI_SSID is empty - the sign node will fail to associate");
    }
}

fn linker_be_nice() {
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        let kind = &args[1];
        let what = &args[2];

        match kind.as_str() {
            "undefined-symbol" => match what.as_str() {
                "_defmt_timestamp" => {
                    eprintln!();
                    eprintln!("💡 `defmt` not found - make sure `defmt.x` is added as a linker script and you have included `use defmt_rtt as _;`");
                    eprintln!();
                }
                "_stack_start" => {
                    eprintln!();
                    eprintln!("💡 Is the linker script `linkall.x` missing?");
                    eprintln!();
                }
                "esp_wifi_preempt_enable"
                | "esp_wifi_preempt_yield_task"
                | "esp_wifi_preempt_task_create" => {
                    eprintln!();
                    eprintln!("💡 `esp-wifi` has no scheduler enabled. Make sure you have the `builtin-scheduler` feature enabled, or that you provide an external scheduler.");
                    eprintln!();
                }
                _ => (),
            },
            // we don't have anything helpful for "missing-lib" yet
            _ => {
                std::process::exit(1);
            }
        }

        std::process::exit(0);
    }

    println!(
        "cargo:rustc-link-arg=--error-handling-script={}",
        env::current_exe().unwrap().display()
    );
}
