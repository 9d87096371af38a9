// vim: noet

use fftw::array::AlignedVec;
use fftw::plan::*;
use fftw::types::*;

pub struct SignalProcessing
{
	block_len: usize,

	fft_input: AlignedVec<f32>,
	fft_output: AlignedVec<c32>,

	fft_plan: R2CPlan32,

	fft_absolute: Vec<f32>,
	mirrored: Vec<f32>,
}

impl SignalProcessing
{
	pub fn new(block_len: usize) -> fftw::error::Result<SignalProcessing>
	{
		let freq_domain_size = block_len/2 + 1;

		let s = SignalProcessing {
			block_len: block_len,
			fft_input:  AlignedVec::new(block_len),
			fft_output: AlignedVec::new(freq_domain_size),
			fft_plan:   R2CPlan::aligned(&[block_len], Flag::MEASURE)?,

			fft_absolute: vec![0.0; freq_domain_size],
			mirrored: vec![0.0; block_len],
		};

		Ok(s)
	}

	pub fn import_i16_mono(&mut self, data: &[i16]) -> std::result::Result<(), &str>
	{
		if data.len() != self.fft_input.len() {
			return Err("Mono data length does not match the FFT input length.");
		}

		data.iter()
			.map(|&sample| (sample as f32) / 65536.0 * 200.0)
			.zip(self.fft_input.iter_mut())
			.for_each(|(c, t)| *t = c);

		Ok(())
	}

	pub fn update_fft(&mut self) -> fftw::error::Result<()>
	{
		self.fft_plan.r2c(&mut self.fft_input, &mut self.fft_output)?;

		// forward transform normalized by the block length
		for (i, abs_sample) in self.fft_absolute.iter_mut().enumerate() {
			*abs_sample = self.fft_output[i].norm() / self.block_len as f32;
		}

		Ok(())
	}

	// Condenses the magnitude spectrum into one brightness value per pixel.
	// The non-redundant half of the spectrum is laid out as a palindrome
	// (reversed copy first, forward copy second), so the lowest bins meet in
	// the middle of the strip and the highest sit at its ends.
	pub fn spectrum_profile(&mut self, profile: &mut [f32])
	{
		let half_len = self.block_len / 2;
		let mirrored_len = 2 * half_len;

		if profile.is_empty() || half_len == 0 {
			return;
		}

		for i in 0..half_len {
			self.mirrored[i] = self.fft_absolute[half_len - 1 - i];
			self.mirrored[half_len + i] = self.fft_absolute[i];
		}

		let bins_per_pixel = mirrored_len as f32 / profile.len() as f32;

		for (i, value) in profile.iter_mut().enumerate() {
			let start = (i as f32 * bins_per_pixel) as usize;
			let mut stop = ((i + 1) as f32 * bins_per_pixel) as usize;
			while stop >= mirrored_len {
				stop -= 1;
			}

			// adjacent windows share their boundary bin
			let count = (stop - start + 1) as f32;
			let mut average = 0.0;
			for j in start..=stop {
				average += self.mirrored[j] / count;
			}

			*value = average / 0.2 * 255.0;
			if *value > 255.0 {
				*value = 255.0;
			}
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn analyze(samples: &[i16], pixel_count: usize) -> Vec<f32>
	{
		let mut sigproc = SignalProcessing::new(samples.len()).unwrap();
		sigproc.import_i16_mono(samples).unwrap();
		sigproc.update_fft().unwrap();

		let mut profile = vec![0.0; pixel_count];
		sigproc.spectrum_profile(&mut profile);
		profile
	}

	#[test]
	fn zero_block_yields_zero_profile()
	{
		let profile = analyze(&[0i16; 64], 8);

		assert_eq!(profile.len(), 8);
		for &value in profile.iter() {
			assert!(value.is_finite());
			assert!(value.abs() < 1e-6);
		}
	}

	#[test]
	fn constant_signal_lands_in_the_strip_center()
	{
		// a DC-only signal has all its energy in the lowest bin, which the
		// palindromic layout places in the middle of the strip
		let profile = analyze(&[6553i16; 64], 4);

		assert!(profile[0] < 1.0);
		assert!(profile[3] < 1.0);
		assert!(profile[1] > 200.0);
		assert!(profile[2] > 200.0);
	}

	#[test]
	fn profile_never_exceeds_255()
	{
		let samples: Vec<i16> = (0..128).map(|i| if i % 2 == 0 { 20000 } else { -20000 }).collect();
		let profile = analyze(&samples, 10);

		for &value in profile.iter() {
			assert!(value <= 255.0);
		}
	}

	#[test]
	fn length_mismatch_is_rejected()
	{
		let mut sigproc = SignalProcessing::new(64).unwrap();
		assert!(sigproc.import_i16_mono(&[0i16; 10]).is_err());
	}
}
