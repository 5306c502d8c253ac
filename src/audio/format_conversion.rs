// Format conversion for CPAL audio streams
//
// The drum kit renders mono f32; devices may want f32, i16 or u16 with any
// channel count. Conversion goes through cpal's `FromSample<f32>` and never
// allocates.

use cpal::{FromSample, Sample};

/// Write one mono sample to every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = Sample::from_sample::<f32>(internal_sample);
    }
}

/// Fill a whole buffer with silence in the device format
#[inline]
pub fn write_silence<T>(output: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    for sample in output.iter_mut() {
        *sample = Sample::from_sample::<f32>(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mono_to_interleaved_f32() {
        let mut frame = [0.0f32; 2];
        write_mono_to_interleaved_frame(0.5, &mut frame);
        assert_eq!(frame, [0.5, 0.5]);
    }

    #[test]
    fn test_write_mono_to_interleaved_i16() {
        let mut frame = [0i16; 6];
        write_mono_to_interleaved_frame(0.5, &mut frame);
        assert!(frame.iter().all(|&s| s == frame[0]));
        assert!((16_000..=16_400).contains(&frame[0]));
    }

    #[test]
    fn test_write_silence_u16() {
        let mut buffer = [0u16; 8];
        write_silence(&mut buffer);
        // u16 is offset binary: silence sits at mid-scale
        assert!(buffer.iter().all(|&s| (32_767..=32_768).contains(&s)));
    }
}
