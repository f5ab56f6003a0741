//! Terminal consumer: prints each coalesced refresh and maps typed lines to
//! engine commands.

use crate::app::DiscoveryObserver;
use crate::availability::BluetoothAvailability;
use crate::device::Device;
use crate::view::{self, ViewState, EMPTY_MESSAGE};

pub const HELP: &str = "Commands: s = start/stop scan, c = clear, /text = search, / = clear search, q = quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    ToggleScan,
    Clear,
    Search(String),
    Quit,
    Help,
}

pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    if let Some(query) = line.strip_prefix('/') {
        return Some(ConsoleCommand::Search(query.to_string()));
    }
    match line {
        "s" => Some(ConsoleCommand::ToggleScan),
        "c" => Some(ConsoleCommand::Clear),
        "q" => Some(ConsoleCommand::Quit),
        "h" | "?" => Some(ConsoleCommand::Help),
        _ => None,
    }
}

pub struct ConsoleObserver {
    max_rows: usize,
}

impl ConsoleObserver {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }
}

impl DiscoveryObserver for ConsoleObserver {
    fn on_scan_state_changed(&mut self, is_scanning: bool) {
        if is_scanning {
            println!("Scanning for devices...");
        } else {
            println!("Scan stopped");
        }
    }

    fn on_scan_error(&mut self, description: &str, state: BluetoothAvailability) {
        let message = view::error_message(state);
        println!("{}: {}", message.title, message.body);
        println!("  ({})", description);
    }

    fn on_refresh(&mut self, pane: ViewState, devices: &[Device], query: &str) {
        print!("{}", render(pane, devices, query, self.max_rows));
    }
}

fn signal_meter(device: &Device) -> String {
    let bars = device.signal_bars() as usize;
    format!("[{}{}]", "#".repeat(bars), ".".repeat(4 - bars))
}

fn render_row(device: &Device) -> String {
    let link = if device.connectable { " (connectable)" } else { "" };
    let mut row = format!(
        "{} {:>4} dBm {:<9} {} [{}]{}\n",
        signal_meter(device),
        device.rssi,
        device.signal_tier().label(),
        device.display_name(),
        device.address,
        link,
    );

    let services = view::service_summary(device);
    if !services.is_empty() {
        row.push_str(&format!("      {}\n", services));
    }
    row.push_str(&format!("      {}\n", view::meta_line(device)));
    row
}

/// Full text for one refresh.
pub fn render(pane: ViewState, devices: &[Device], query: &str, max_rows: usize) -> String {
    match pane {
        ViewState::Unavailable(state) => {
            let message = view::error_message(state);
            format!("\n{}\n{}\n", message.title, message.body)
        }
        ViewState::Empty => format!("\n{}\n{}\n", EMPTY_MESSAGE.title, EMPTY_MESSAGE.body),
        ViewState::List => {
            let mut out = String::from("\n");
            if devices.is_empty() && !query.is_empty() {
                out.push_str(&view::no_results_message(query));
                out.push('\n');
                return out;
            }

            let label = view::count_label(devices.len());
            if !label.is_empty() {
                out.push_str(&label);
                out.push('\n');
            }
            for device in devices.iter().take(max_rows) {
                out.push_str(&render_row(device));
            }
            if devices.len() > max_rows {
                out.push_str(&format!("... {} more\n", devices.len() - max_rows));
            }
            out
        }
    }
}
