// vim: noet

use std::fmt;
use std::error::Error as StdError;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig};

use crate::ringbuffer::SampleRing;

/////////// Error Type and Implementation ////////////

#[derive(Debug)]
pub enum CaptureError
{
	DeviceNotFound(usize),
	UnsupportedFormat(SampleFormat),
	Devices(cpal::DevicesError),
	DefaultConfig(cpal::DefaultStreamConfigError),
	BuildStream(cpal::BuildStreamError),
	PlayStream(cpal::PlayStreamError),
}

impl fmt::Display for CaptureError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			CaptureError::DeviceNotFound(i) => f.write_fmt(format_args!("no input device with index {}", i))?,
			CaptureError::UnsupportedFormat(s) => f.write_fmt(format_args!("unsupported sample format {:?}", s))?,
			CaptureError::Devices(e) => f.write_fmt(format_args!("{}", e))?,
			CaptureError::DefaultConfig(e) => f.write_fmt(format_args!("{}", e))?,
			CaptureError::BuildStream(e) => f.write_fmt(format_args!("{}", e))?,
			CaptureError::PlayStream(e) => f.write_fmt(format_args!("{}", e))?,
		};

		Ok(())
	}
}

impl StdError for CaptureError {}

/////////// Capture ////////////

// Owns the input stream for the process lifetime. The device delivers data
// on its own thread; the callbacks below only downmix to mono and append
// little endian PCM bytes to the shared ring.
pub struct AudioCapture
{
	_stream: cpal::Stream,
}

impl AudioCapture
{
	pub fn start(device_index: usize, samp_rate: u32, ring: Arc<SampleRing>) -> Result<AudioCapture, CaptureError>
	{
		let host = cpal::default_host();

		let device = host.input_devices()
			.map_err(CaptureError::Devices)?
			.nth(device_index)
			.ok_or(CaptureError::DeviceNotFound(device_index))?;

		let supported = device.default_input_config()
			.map_err(CaptureError::DefaultConfig)?;

		let channels = supported.channels() as usize;

		let stream_config = StreamConfig {
			channels: supported.channels(),
			sample_rate: SampleRate(samp_rate),
			buffer_size: BufferSize::Default,
		};

		let stream = match supported.sample_format() {
			SampleFormat::I16 => {
				let ring = ring.clone();
				device.build_input_stream(
					&stream_config,
					move |data: &[i16], _: &cpal::InputCallbackInfo| {
						append_i16(&ring, data, channels);
					},
					|err| eprintln!("Audio stream error: {}", err),
					None,
				).map_err(CaptureError::BuildStream)?
			},
			SampleFormat::F32 => {
				let ring = ring.clone();
				device.build_input_stream(
					&stream_config,
					move |data: &[f32], _: &cpal::InputCallbackInfo| {
						append_f32(&ring, data, channels);
					},
					|err| eprintln!("Audio stream error: {}", err),
					None,
				).map_err(CaptureError::BuildStream)?
			},
			format => return Err(CaptureError::UnsupportedFormat(format)),
		};

		stream.play().map_err(CaptureError::PlayStream)?;

		Ok(AudioCapture {
			_stream: stream,
		})
	}
}

fn append_i16(ring: &SampleRing, data: &[i16], channels: usize)
{
	let mono: Vec<i16> = data.chunks_exact(channels)
		.map(|frame| {
			let sum: i32 = frame.iter().map(|&s| s as i32).sum();
			(sum / channels as i32) as i16
		})
		.collect();

	let mut bytes = vec![0u8; 2 * mono.len()];
	LittleEndian::write_i16_into(&mono, &mut bytes);

	ring.append(&bytes);
}

fn append_f32(ring: &SampleRing, data: &[f32], channels: usize)
{
	let mono: Vec<i16> = data.chunks_exact(channels)
		.map(|frame| {
			let sum: f32 = frame.iter().sum();
			let sample = sum / channels as f32 * 32768.0;
			sample.max(-32768.0).min(32767.0) as i16
		})
		.collect();

	let mut bytes = vec![0u8; 2 * mono.len()];
	LittleEndian::write_i16_into(&mono, &mut bytes);

	ring.append(&bytes);
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn stereo_i16_is_downmixed_and_serialized()
	{
		let ring = SampleRing::new(64);
		append_i16(&ring, &[1000, -1000, 400, 600], 2);

		let mut block = [0u8; 4];
		assert!(ring.read_block(&mut block));

		// frames (1000, -1000) and (400, 600) average to 0 and 500
		assert_eq!(block, [0x00, 0x00, 0xf4, 0x01]);
	}

	#[test]
	fn f32_samples_are_scaled_and_clipped()
	{
		let ring = SampleRing::new(64);
		append_f32(&ring, &[0.5, -1.0, 1.0], 1);

		let mut block = [0u8; 6];
		assert!(ring.read_block(&mut block));

		let mut samples = [0i16; 3];
		LittleEndian::read_i16_into(&block, &mut samples);

		assert_eq!(samples, [16384, -32768, 32767]);
	}
}
