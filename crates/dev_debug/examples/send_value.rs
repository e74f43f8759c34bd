use std::{collections::BTreeMap, env, time::Duration};

use dev_debug::{Bootstrap, Context, Inspect};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("usage: send_value [LABEL]");
    eprintln!("  DEV_DEBUG_ENDPOINT=http://127.0.0.1:3000/debug  collector URL");
    eprintln!("  DEV_DEBUG_ENABLED=1                            report outside a CLI context");
    eprintln!("  RUST_LOG=dev_debug=trace                       show delivery outcomes");
}

#[derive(Inspect)]
struct LineItem {
    pub sku: &'static str,
    pub quantity: u32,
}

#[derive(Inspect)]
struct Order {
    pub id: u64,
    pub(crate) items: Vec<LineItem>,
    notes: BTreeMap<&'static str, &'static str>,
    #[inspect(skip)]
    _secret: &'static str,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let label = args.next();
    if label.as_deref() == Some("--help") {
        usage();
        return;
    }

    let bootstrap = Bootstrap::from_env();
    if !bootstrap.is_active() {
        eprintln!("debug reporting inactive in {:?} context", bootstrap.context());
    }
    let client = bootstrap.client();

    let order = Order {
        id: 1042,
        items: vec![
            LineItem {
                sku: "MUG-01",
                quantity: 2,
            },
            LineItem {
                sku: "TEE-XL",
                quantity: 1,
            },
        ],
        notes: BTreeMap::from([("gift", "yes")]),
        _secret: "do-not-send",
    };

    let context = match label {
        Some(label) => Context::new().label(label),
        None => Context::new(),
    };
    client.send(&order, context);
    client.dbg(&("status", ("paid", 1299)));

    if !client.flush(Duration::from_secs(1)) {
        eprintln!("collector did not answer in time");
    }
}
