use std::{env, fs::File, io::Write, path::Path};

/// Samples per waveform period. At the 32 kHz tick rate this makes the
/// fundamental 1 kHz.
const TABLE_LEN: u32 = 32;

/// DAC code for zero output. All tables swing symmetrically around it.
const MIDSCALE: i32 = 0x17ff;

/// Peak deviation from `MIDSCALE` for a single tone.
const TONE_AMPLITUDE: f64 = 1900.;

/// Per-harmonic amplitude for the two-tone sum. The peak of
/// `sin(x) + sin(2x)` is about 1.76, so this lands just under
/// `TONE_AMPLITUDE`.
const SUM_AMPLITUDE: f64 = 1000.;

fn main() {
    println!("cargo::rerun-if-changed=memory.x");
    println!("cargo::rerun-if-changed=build.rs");

    let table_path =
        Path::new(&env::var("OUT_DIR").unwrap()).join("waveforms.rs");
    let mut table = File::create(table_path).unwrap();

    writeln!(table, "pub const TABLE_LEN: usize = {TABLE_LEN};").unwrap();
    writeln!(table, "pub const MIDSCALE: u16 = 0x{MIDSCALE:04x};").unwrap();

    emit(&mut table, "SINE_1KHZ", TONE_AMPLITUDE, &[1]);
    emit(&mut table, "SINE_2KHZ", TONE_AMPLITUDE, &[2]);
    emit(&mut table, "SINE_1KHZ_2KHZ", SUM_AMPLITUDE, &[1, 2]);
}

/// Writes one table as a `static` array. Each sample is the midscale code
/// plus the rounded sum of the requested harmonics of the fundamental.
fn emit(out: &mut File, name: &str, amplitude: f64, harmonics: &[u32]) {
    writeln!(out, "pub static {name}: [u16; {TABLE_LEN}] = [").unwrap();
    for i in 0..TABLE_LEN {
        let x = 2. * std::f64::consts::PI * f64::from(i) / f64::from(TABLE_LEN);
        let y: f64 = harmonics.iter().map(|&h| (x * f64::from(h)).sin()).sum();
        let sample = MIDSCALE + (y * amplitude).round() as i32;
        assert!((0..=0x1fff).contains(&sample), "{name}[{i}] out of range");
        writeln!(out, "    0x{sample:04X},").unwrap();
    }
    writeln!(out, "];").unwrap();
}
