// vim: noet

use std::fmt;
use std::error::Error as StdError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use byteorder::{ByteOrder, LittleEndian};

use crate::colormap::{map_colors, Gradient};
use crate::config;
use crate::ringbuffer::SampleRing;
use crate::signal_processing::SignalProcessing;
use crate::uartproto::UartProto;

type Result<T> = std::result::Result<T, RenderError>;

/////////// Error Type and Implementation ////////////

#[derive(Debug)]
pub enum RenderError
{
	FftError(fftw::error::Error),
	IoError(std::io::Error),
	ErrorMessage(std::string::String),
}

impl fmt::Display for RenderError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			RenderError::FftError(e) => f.write_fmt(format_args!("FFT error: {:?}", e))?,
			RenderError::IoError(e) => f.write_fmt(format_args!("I/O error: {}", e))?,
			RenderError::ErrorMessage(s) => f.write_fmt(format_args!("Message({})", s))?,
		};

		Ok(())
	}
}

impl StdError for RenderError {}

impl From<fftw::error::Error> for RenderError {
	fn from(err: fftw::error::Error) -> RenderError {
		RenderError::FftError(err)
	}
}

impl From<std::io::Error> for RenderError {
	fn from(err: std::io::Error) -> RenderError {
		RenderError::IoError(err)
	}
}

/////////// Render Loop ////////////

pub struct RenderLoop
{
	sigproc: SignalProcessing,
	gradient: Gradient,
	proto: UartProto,
	ring: Arc<SampleRing>,

	// smoothed per-pixel brightness, the only state carried across ticks
	brightness: Vec<f32>,

	// scratch buffers reused every tick
	profile: Vec<f32>,
	colors: Vec<u32>,
	block: Vec<u8>,
	samples: Vec<i16>,

	running: Arc<AtomicBool>,
}

impl RenderLoop
{
	pub fn new(sigproc: SignalProcessing, gradient: Gradient, proto: UartProto, ring: Arc<SampleRing>) -> RenderLoop
	{
		RenderLoop {
			sigproc: sigproc,
			gradient: gradient,
			proto: proto,
			ring: ring,

			brightness: vec![0.0; config::PIXEL_COUNT],

			profile: vec![0.0; config::PIXEL_COUNT],
			colors: Vec::with_capacity(config::PIXEL_COUNT),
			block: vec![0; config::BLOCK_BYTES],
			samples: vec![0; config::BLOCK_LEN],

			running: Arc::new(AtomicBool::new(true)),
		}
	}

	// shared flag for requesting shutdown from another thread
	pub fn stop_handle(&self) -> Arc<AtomicBool>
	{
		self.running.clone()
	}

	pub fn run(&mut self, fps: u64) -> Result<()>
	{
		// switch all pixels off before steady-state rendering starts
		self.proto.clear()?;

		let period = Duration::from_millis(1000 / fps);
		let mut next_tick = Instant::now() + period;

		while self.running.load(Ordering::SeqCst) {
			let now = Instant::now();
			if next_tick > now {
				thread::sleep(next_tick - now);
			}

			self.tick()?;

			next_tick += period;

			// a tick that overran its slot must not cause a burst of
			// catch-up renders; the missed deadlines are dropped
			let now = Instant::now();
			while next_tick < now {
				next_tick += period;
			}
		}

		// leave the strip dark on shutdown
		self.proto.clear()?;

		Ok(())
	}

	fn tick(&mut self) -> Result<()>
	{
		// pull exactly one block; skip the tick when the capture is behind
		if !self.ring.read_block(&mut self.block) {
			return Ok(());
		}

		// a zeroed penultimate byte marks a silent block: the previous
		// frame stays on the strip and nothing is sent
		if self.block[self.block.len() - 2] == 0 {
			return Ok(());
		}

		LittleEndian::read_i16_into(&self.block, &mut self.samples);

		self.sigproc.import_i16_mono(&self.samples)
			.map_err(|e| RenderError::ErrorMessage(e.to_string()))?;
		self.sigproc.update_fft()?;
		self.sigproc.spectrum_profile(&mut self.profile);

		smooth(&mut self.brightness, &self.profile);

		map_colors(&self.brightness, &self.gradient, &mut self.colors);

		self.proto.write_frame(&self.colors)?;

		Ok(())
	}
}

// exponential smoothing with factor 0.5: each pixel moves halfway from its
// previous value towards the new raw brightness
fn smooth(frame: &mut [f32], profile: &[f32])
{
	for (value, &raw) in frame.iter_mut().zip(profile.iter()) {
		*value = (raw + *value) / 2.0;
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn smoothing_converges_towards_repeated_input()
	{
		let target = [200.0f32, 10.0, 0.0, 255.0];
		let mut frame = [0.0f32; 4];

		let mut last_error = f32::MAX;
		for _ in 0..16 {
			smooth(&mut frame, &target);

			let error = frame.iter()
				.zip(target.iter())
				.map(|(f, t)| (t - f).abs())
				.fold(0.0, f32::max);

			assert!(error < last_error || error == 0.0);
			last_error = error;
		}

		assert!(last_error < 0.01);
	}

	#[test]
	fn smoothing_averages_old_and_new_values()
	{
		let mut frame = [100.0f32, 0.0];
		smooth(&mut frame, &[0.0, 50.0]);

		assert_eq!(frame, [50.0, 25.0]);
	}
}
