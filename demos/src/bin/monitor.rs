#[path = "../serial_port.rs"]
mod serial_port;

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use displax::{Clock, Config, ConnectionState, DisplaxTouch, FrameSize, TouchContact};
use serial_port::SerialPort;

#[derive(Parser)]
struct Opts {
    /// Serial device the sensor is connected to.
    #[clap(short, long)]
    device: String,
    /// Frame width in mm, if the sensor does not report it.
    #[clap(long, requires = "height")]
    width: Option<u16>,
    /// Frame height in mm, if the sensor does not report it.
    #[clap(long, requires = "width")]
    height: Option<u16>,
}

struct StdClock(Instant);

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

fn main() {
    env_logger::init();

    let opts: Opts = Opts::parse();
    let port = SerialPort::new(Path::new(&opts.device)).unwrap();

    let on_touch = |contacts: &[TouchContact]| {
        for c in contacts {
            let FrameSize { width, height } = c.frame_size;
            log::info!(
                "touch {}: ({}, {}) size {}x{} pressure {} [frame {}x{}]",
                c.id,
                c.x,
                c.y,
                c.width,
                c.height,
                c.pressure,
                width,
                height
            );
        }
    };
    let on_state = |new: ConnectionState, previous: ConnectionState| {
        log::info!("sensor state {:?} -> {:?}", previous, new);
    };

    let mut touch = DisplaxTouch::new(port, StdClock(Instant::now()), Config::default());
    touch.add_touch_listener(&on_touch).unwrap();
    touch.set_state_observer(Some(&on_state));
    if let (Some(width), Some(height)) = (opts.width, opts.height) {
        touch.set_frame_size(width, height);
    }

    touch.begin();

    loop {
        touch.poll();

        if touch.state() == ConnectionState::InitializationFailed {
            log::error!("no answer from the sensor, retrying");
            thread::sleep(Duration::from_secs(1));
            touch.begin();
        }

        thread::sleep(Duration::from_millis(1));
    }
}
