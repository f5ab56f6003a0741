use ble_companion::adapter::platform::PlatformAdapter;
use ble_companion::app::DiscoveryApp;
use ble_companion::config::Config;
use ble_companion::console::{parse_command, ConsoleCommand, ConsoleObserver, HELP};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

/// How often the consumer loop drains worker events.
const TICK_INTERVAL: Duration = Duration::from_millis(16);

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{}; using default settings", e);
            Config::default()
        }
    };

    let mut app = DiscoveryApp::new(
        PlatformAdapter::new(),
        ConsoleObserver::new(config.max_rows),
        config.refresh_interval(),
    );

    // Stdin blocks, so it gets its own thread feeding the consumer loop
    let (line_sender, line_receiver) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if line_sender.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Stopped reading commands: {}", e);
                    break;
                }
            }
        }
    });

    println!("{}", HELP);
    if config.scan_on_launch {
        app.start_scan();
    }

    let mut stdin_open = true;
    'run: loop {
        while stdin_open {
            let line = match line_receiver.try_recv() {
                Ok(line) => line,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    stdin_open = false;
                    break;
                }
            };

            match parse_command(&line) {
                Some(ConsoleCommand::ToggleScan) => app.toggle_scan(),
                Some(ConsoleCommand::Clear) => app.clear_devices(),
                Some(ConsoleCommand::Search(query)) => app.set_search_query(&query),
                Some(ConsoleCommand::Help) => println!("{}", HELP),
                Some(ConsoleCommand::Quit) => break 'run,
                None => println!("Unknown command. {}", HELP),
            }
        }

        app.tick(Instant::now());
        thread::sleep(TICK_INTERVAL);
    }

    app.shutdown();
}
