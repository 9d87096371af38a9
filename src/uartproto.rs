// vim: noet

use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};

use crate::config;

pub const BYTES_PER_PIXEL: usize = 8;

// One output byte per three pixel-word bits. Transmitted LSB-first inside
// 7N1 framing at 2.4 MBaud, each byte reproduces the short/long pulse pair
// the strip expects for its three protocol bits.
pub const BIT_TRIPLETS: [u8; 8] = [
	0x5b, 0x1b, 0x53, 0x13,
	0x5a, 0x1a, 0x52, 0x12,
];

pub struct PixelEncoder
{
	frame: Vec<u8>,
}

impl PixelEncoder
{
	pub fn new(pixel_count: usize) -> PixelEncoder
	{
		PixelEncoder {
			frame: vec![0; pixel_count * BYTES_PER_PIXEL],
		}
	}

	// translates each 24 bit pixel word into its eight symbol bytes,
	// most significant triplet first
	pub fn encode(&mut self, colors: &[u32]) -> &[u8]
	{
		let mut pixels = 0;

		for (group, &color) in self.frame.chunks_exact_mut(BYTES_PER_PIXEL).zip(colors.iter()) {
			group[0] = BIT_TRIPLETS[((color >> 21) & 0x07) as usize];
			group[1] = BIT_TRIPLETS[((color >> 18) & 0x07) as usize];
			group[2] = BIT_TRIPLETS[((color >> 15) & 0x07) as usize];
			group[3] = BIT_TRIPLETS[((color >> 12) & 0x07) as usize];
			group[4] = BIT_TRIPLETS[((color >>  9) & 0x07) as usize];
			group[5] = BIT_TRIPLETS[((color >>  6) & 0x07) as usize];
			group[6] = BIT_TRIPLETS[((color >>  3) & 0x07) as usize];
			group[7] = BIT_TRIPLETS[( color        & 0x07) as usize];

			pixels += 1;
		}

		&self.frame[.. pixels * BYTES_PER_PIXEL]
	}
}

pub struct UartProto
{
	port: Box<dyn SerialPort>,
	encoder: PixelEncoder,
	pixel_count: usize,
}

impl UartProto
{
	pub fn new(port_name: &str, baud_rate: u32, pixel_count: usize) -> serialport::Result<UartProto>
	{
		let port = serialport::new(port_name, baud_rate)
			.data_bits(DataBits::Seven)
			.parity(Parity::None)
			.stop_bits(StopBits::One)
			.timeout(Duration::from_millis(config::WRITE_TIMEOUT_MS))
			.open()?;

		Ok(UartProto {
			port: port,
			encoder: PixelEncoder::new(pixel_count),
			pixel_count: pixel_count,
		})
	}

	// the strip latches on the line going idle, so every frame is flushed
	// out completely before the tick returns
	pub fn write_frame(&mut self, colors: &[u32]) -> std::io::Result<()>
	{
		let frame = self.encoder.encode(colors);

		self.port.write_all(frame)?;
		self.port.flush()
	}

	pub fn clear(&mut self) -> std::io::Result<()>
	{
		let off = vec![0u32; self.pixel_count];
		self.write_frame(&off)
	}
}
