// vim: noet

use std::collections::VecDeque;
use std::sync::Mutex;

// The only resource shared between the capture callback and the render
// thread. Appends must never stall the audio delivery thread, so the ring
// discards its oldest bytes instead of applying backpressure.
pub struct SampleRing
{
	buffer: Mutex<VecDeque<u8>>,
	capacity: usize,
}

impl SampleRing
{
	pub fn new(capacity: usize) -> SampleRing
	{
		SampleRing {
			buffer: Mutex::new(VecDeque::with_capacity(capacity)),
			capacity: capacity,
		}
	}

	pub fn append(&self, data: &[u8])
	{
		// a poisoned lock means the render thread is already going down
		if let Ok(mut buffer) = self.buffer.lock() {
			for &byte in data {
				if buffer.len() == self.capacity {
					buffer.pop_front();
				}
				buffer.push_back(byte);
			}
		}
	}

	// drains exactly block.len() bytes, or nothing at all
	pub fn read_block(&self, block: &mut [u8]) -> bool
	{
		let mut buffer = match self.buffer.lock() {
			Ok(b) => b,
			Err(_) => return false,
		};

		if buffer.len() < block.len() {
			return false;
		}

		for slot in block.iter_mut() {
			match buffer.pop_front() {
				Some(byte) => *slot = byte,
				None => return false,
			}
		}

		true
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	use std::sync::Arc;
	use std::thread;

	#[test]
	fn overflow_discards_oldest()
	{
		let ring = SampleRing::new(4);
		ring.append(&[1, 2, 3, 4]);
		ring.append(&[5, 6]);

		let mut block = [0u8; 4];
		assert!(ring.read_block(&mut block));
		assert_eq!(block, [3, 4, 5, 6]);
	}

	#[test]
	fn short_read_is_refused()
	{
		let ring = SampleRing::new(8);
		ring.append(&[1, 2, 3]);

		let mut block = [0u8; 4];
		assert!(!ring.read_block(&mut block));

		// the refused read must not consume anything
		ring.append(&[4]);
		assert!(ring.read_block(&mut block));
		assert_eq!(block, [1, 2, 3, 4]);
	}

	#[test]
	fn concurrent_append_and_drain()
	{
		let ring = Arc::new(SampleRing::new(1024));

		let writer = {
			let ring = ring.clone();
			thread::spawn(move || {
				for chunk in 0..256u32 {
					ring.append(&[chunk as u8; 16]);
				}
			})
		};

		// the writer pushes 4096 bytes in total, so ten full blocks must
		// become available no matter how the two threads interleave
		let mut block = [0u8; 64];
		let mut drained = 0;
		while drained < 10 {
			if ring.read_block(&mut block) {
				drained += 1;
			}
		}

		writer.join().unwrap();
	}
}
