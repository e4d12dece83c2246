use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use briefos_lib::driver;
use briefos_lib::engine::DispatchOptions;
use briefos_lib::error::CanvasErrorReport;
use briefos_lib::state::AppState;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let state = Arc::new(AppState::new());
    log::info!("Briefing canvas ready for {}", state.config.user_name);
    let (handle, task) = driver::spawn(state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Failed to read stdin: {}", e);
                break;
            }
        };

        let result = match line.trim() {
            "" => continue,
            ":quit" => break,
            ":reset" => handle.reset().await,
            query => {
                let options = DispatchOptions::default()
                    .on_vip_visit_parsed(|visit| {
                        eprintln!("[calendar] visit by {} ({})", visit.visitor, visit.registration.label());
                    })
                    .on_module_detected(|module| eprintln!("[navigate] {}", module));
                match handle.dispatch(query, options).await {
                    Ok(()) => handle.wait_idle().await.map(|snapshot| {
                        match serde_json::to_string_pretty(&snapshot) {
                            Ok(json) => println!("{}", json),
                            Err(e) => log::warn!("Failed to serialize snapshot: {}", e),
                        }
                    }),
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = result {
            let report = CanvasErrorReport::from(&e);
            eprintln!("{} ({})", report.message, report.recovery_suggestion);
            if !report.recoverable {
                break;
            }
        }
    }

    let _ = handle.shutdown().await;
    let _ = task.await;
}
