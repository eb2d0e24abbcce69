use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use focus::{FocusChanged, FocusStore, FocusTracker, ViewMode};
use runtime::EventBus;
use scene::{EntityStore, FocusConfig};
use streaming::{ConnectionState, ControlEvent, SyncConfig};
use sync::SyncChannel;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod camera_path;

use camera_path::OrbitPath;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless focus client: flies a scripted camera and syncs focus")]
struct Args {
    /// Relay WebSocket endpoint
    #[arg(long, default_value = "ws://127.0.0.1:9300/ws")]
    relay_url: String,

    /// Posts JSON (array of {id, slug, x, y, z, impact?})
    #[arg(long)]
    posts: PathBuf,

    /// Distance of the target point ahead of the camera
    #[arg(long, default_value_t = 30.0)]
    target_distance: f64,

    /// Distance advantage a new candidate needs over the current focus
    #[arg(long, default_value_t = 1.0)]
    hysteresis_margin: f64,

    /// Minimum interval between outbound focus updates
    #[arg(long, default_value_t = 33)]
    min_send_interval_ms: u64,

    /// Camera ticks per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Number of ticks to run (0 = until interrupted)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Radius of the scripted orbit around the scene centroid
    #[arg(long, default_value_t = 120.0)]
    orbit_radius: f64,

    /// Seconds per full orbit
    #[arg(long, default_value_t = 20.0)]
    orbit_seconds: f64,

    /// Run without connecting to the relay
    #[arg(long)]
    no_sync: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = FocusConfig::new(args.target_distance, args.hysteresis_margin)?;
    let entities = EntityStore::load(&args.posts)?;
    info!("loaded {} posts from {}", entities.len(), args.posts.display());
    if entities.is_empty() {
        warn!("no placed posts; focus will stay empty");
    }

    let store = Arc::new(FocusStore::new());
    store.subscribe(|ev: &FocusChanged| match &ev.focus {
        Some(f) => info!(
            "focus -> {} at ({:.1}, {:.1}, {:.1}) [{:?}]",
            f.id, f.position.x, f.position.y, f.position.z, ev.origin
        ),
        None => info!("focus cleared [{:?}]", ev.origin),
    });

    let modes = Arc::new(EventBus::<ViewMode>::new());
    let mut tracker = FocusTracker::new(Arc::clone(&store), config);
    tracker.follow_view_mode(Arc::clone(&modes));
    modes.publish(&ViewMode::Flight);

    let reset_requested = Arc::new(AtomicBool::new(false));
    let counting = Arc::new(AtomicU64::new(0));

    let channel = if args.no_sync {
        None
    } else {
        let sync_config = SyncConfig {
            min_send_interval_ms: args.min_send_interval_ms,
            ..SyncConfig::with_url(args.relay_url.clone())
        };
        let channel = SyncChannel::new(Arc::clone(&store), sync_config);
        channel.connection_events().subscribe(|state: &ConnectionState| {
            info!("relay connection: {state:?}");
        });
        let reset = Arc::clone(&reset_requested);
        let count = Arc::clone(&counting);
        channel.control_events().subscribe(move |ev: &ControlEvent| match ev {
            ControlEvent::ResetView => {
                info!("remote resetView");
                reset.store(true, Ordering::Release);
            }
            ControlEvent::StartCounting => {
                let n = count.fetch_add(1, Ordering::AcqRel) + 1;
                info!("remote startCounting (#{n})");
            }
        });
        channel.ensure_connected();
        Some(channel)
    };

    let fps = args.fps.max(1);
    let period_frames = (args.orbit_seconds.max(0.0) * f64::from(fps)).round() as u64;
    let path = OrbitPath::around(&entities, args.orbit_radius, period_frames);
    info!(
        "orbiting ({:.1}, {:.1}, {:.1}) at radius {} ({} frames per turn)",
        path.center().x,
        path.center().y,
        path.center().z,
        args.orbit_radius,
        period_frames.max(1)
    );

    let run = async {
        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
        let mut frame = 0u64;
        let mut ticks = 0u64;
        while args.frames == 0 || ticks < args.frames {
            ticker.tick().await;
            if reset_requested.swap(false, Ordering::AcqRel) {
                frame = 0;
            }
            tracker.report_local_focus_candidate(&path.pose(frame), &entities);
            frame += 1;
            ticks += 1;
        }
        ticks
    };

    tokio::select! {
        ticks = run => info!("finished after {ticks} frames"),
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    if let Some(channel) = channel {
        // Give the last coalesced update a chance to leave.
        tokio::time::sleep(Duration::from_millis(args.min_send_interval_ms)).await;
        channel.shutdown();
    }
    Ok(())
}
