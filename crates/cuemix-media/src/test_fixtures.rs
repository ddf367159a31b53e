// Test-only WAV emitter. Writes 32-bit float PCM so fixture samples
// survive the round trip bit-exactly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_f32_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[f32]) {
    assert_eq!(samples.len() % channels as usize, 0);

    let data_size = (samples.len() * 4) as u32;
    let byte_rate = sample_rate * channels as u32 * 4;
    let block_align = channels * 4;

    let mut file = File::create(path).expect("create fixture wav");
    file.write_all(b"RIFF").expect("riff");
    file.write_all(&(36 + data_size).to_le_bytes()).expect("size");
    file.write_all(b"WAVE").expect("wave");
    file.write_all(b"fmt ").expect("fmt");
    file.write_all(&16u32.to_le_bytes()).expect("fmt size");
    file.write_all(&3u16.to_le_bytes()).expect("ieee float tag");
    file.write_all(&channels.to_le_bytes()).expect("channels");
    file.write_all(&sample_rate.to_le_bytes()).expect("rate");
    file.write_all(&byte_rate.to_le_bytes()).expect("byte rate");
    file.write_all(&block_align.to_le_bytes()).expect("align");
    file.write_all(&32u16.to_le_bytes()).expect("bits");
    file.write_all(b"data").expect("data");
    file.write_all(&data_size.to_le_bytes()).expect("data size");
    for sample in samples {
        file.write_all(&sample.to_le_bytes()).expect("sample");
    }
}
