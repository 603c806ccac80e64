// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use analytics_tracker::config::load_config_with_env;
use analytics_tracker::record::Properties;
use analytics_tracker::sink::SinkFactory;
use analytics_tracker::tracker::{RecordOptions, Tracker};
use analytics_tracker::{LogErrorHandler, PropertyValue};
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Analytics tracker demo - send sample events through a configured sink
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Distinct ID to report events under
    #[arg(short, long, default_value = "demo-user")]
    distinct_id: String,

    /// Account ID to report events under
    #[arg(short, long)]
    account_id: Option<String>,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration from file
    let config = load_config_with_env(&args.config)?;

    // Initialize tracing with configured level
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting analytics tracker demo");
    info!("Loaded configuration from: {:?}", args.config);
    info!("Sink backend: {}", config.sink.backend);

    // Create delivery sink and tracker
    let sink = SinkFactory::create(&config.sink)?;
    let mut tracker =
        Tracker::with_error_handler(sink, config.tracker.clone(), Box::new(LogErrorHandler));

    let opts = RecordOptions {
        distinct_id: Some(args.distinct_id.clone()),
        account_id: args.account_id.clone(),
        ..RecordOptions::default()
    };

    // Session-scoped properties attached to every event
    let mut super_properties = Properties::new();
    super_properties.insert("channel".to_string(), PropertyValue::from("demo"));
    super_properties.insert("vip_level".to_string(), PropertyValue::from(1));
    tracker.set_super_properties(super_properties, false);

    // Recomputed for every event
    tracker.set_dynamic_properties(|| {
        let mut properties = Properties::new();
        properties.insert("reported_at".to_string(), PropertyValue::from(Local::now()));
        properties
    });

    let mut properties = Properties::new();
    properties.insert("product".to_string(), PropertyValue::from("widget"));
    properties.insert("price".to_string(), PropertyValue::from(134.1));
    properties.insert("in_stock".to_string(), PropertyValue::from(true));
    properties.insert(
        "tags".to_string(),
        PropertyValue::from(vec!["new", "featured"]),
    );
    tracker.track("product_view", properties, opts.clone());

    let mut user_data = Properties::new();
    user_data.insert("nickname".to_string(), PropertyValue::from("demo"));
    user_data.insert("age".to_string(), PropertyValue::from(30));
    tracker.user_set(user_data, opts.clone());

    let mut counters = Properties::new();
    counters.insert("purchases".to_string(), PropertyValue::from(1));
    counters.insert("spend".to_string(), PropertyValue::from(15.88));
    tracker.user_add(counters, opts.clone());

    tracker.user_unset(&["nickname"], opts);

    tracker.flush();
    tracker.close();

    info!("Demo finished");
    Ok(())
}
