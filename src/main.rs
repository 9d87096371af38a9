// vim: noet

use std::process::exit;
use std::sync::Arc;

mod capture;
mod colormap;
mod config;
mod render;
mod ringbuffer;
mod signal_processing;
mod uartproto;

use crate::capture::AudioCapture;
use crate::colormap::Gradient;
use crate::render::RenderLoop;
use crate::ringbuffer::SampleRing;
use crate::signal_processing::SignalProcessing;
use crate::uartproto::UartProto;

fn main()
{
	// the gradient is immutable process-wide state; a bad hex string is fatal
	let gradient = match Gradient::from_hex(config::LOW_COLOR, config::HIGH_COLOR) {
		Ok(g) => g,
		Err(e) => {
			eprintln!("Invalid gradient configuration: {}", e);
			exit(1);
		}
	};

	// without the serial port there is nothing to render to
	let proto = match UartProto::new(config::PORT_NAME, config::BAUD_RATE, config::PIXEL_COUNT) {
		Ok(p) => p,
		Err(e) => {
			eprintln!("Cannot open serial port {}: {}", config::PORT_NAME, e);
			exit(1);
		}
	};

	let sigproc = match SignalProcessing::new(config::BLOCK_LEN) {
		Ok(s) => s,
		Err(e) => {
			eprintln!("Cannot set up the FFT: {:?}", e);
			exit(1);
		}
	};

	let ring = Arc::new(SampleRing::new(config::RING_CAPACITY));

	// a missing audio device is not fatal: ticks simply find no data and
	// the strip holds its last state
	let _capture = match AudioCapture::start(config::DEVICE_INDEX, config::SAMP_RATE, ring.clone()) {
		Ok(c) => Some(c),
		Err(e) => {
			eprintln!("Cannot read data from audio device: {}", e);
			None
		}
	};

	let mut renderloop = RenderLoop::new(sigproc, gradient, proto, ring);

	println!("Done! Starting render loop…");

	if let Err(e) = renderloop.run(config::FPS) {
		eprintln!("Render loop terminated: {}", e);
		exit(1);
	}
}
