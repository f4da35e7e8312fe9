//! With an enormous coupling distance the bit lines stop talking to each
//! other and the model collapses to the plain digital waveforms. These
//! tests pin the per-code bit mapping in that limit.

use wavemix::*;

const ISOLATED: f32 = 1e30;

fn isolated(pulse_strength: f32, stmix: f32) -> ParameterVector {
    ParameterVector::new(0.5, pulse_strength, 1.0, ISOLATED, stmix)
}

fn table_from(f: impl Fn(usize) -> u8) -> ReferenceTable {
    ReferenceTable::from_bytes((0..COUNTER_VALUES).map(f).collect()).unwrap()
}

#[test]
fn sawtooth_pulse_is_the_sawtooth_top_byte() {
    let code = CombinationCode::SawtoothPulse;
    let expected = table_from(|j| (j >> 4) as u8);
    for pulse in [0.0, 1.0, 2.5] {
        let params = isolated(pulse, 0.0);
        assert_eq!(render_table(code, &params), expected, "pulse strength {pulse}");
        assert_eq!(score(code, &params, &expected), 0);
    }
}

#[test]
fn triangle_pulse_is_the_folded_counter() {
    let code = CombinationCode::TrianglePulse;
    let params = isolated(1.0, 0.0);
    let expected = table_from(|j| {
        let folded = ((j >> 3) & 0xff) as u8;
        if j & 0x800 != 0 {
            folded ^ 0xff
        } else {
            folded
        }
    });
    assert_eq!(render_table(code, &params), expected);
}

#[test]
fn sawtooth_triangle_with_no_mix_is_the_shifted_counter() {
    let expected = table_from(|j| ((j >> 3) & 0xff) as u8);
    for code in [CombinationCode::TriangleSawtooth, CombinationCode::TriangleSawtoothPulse] {
        let params = isolated(1.0, 0.0);
        assert_eq!(render_table(code, &params), expected, "code {code}");
    }
}

#[test]
fn counter_zero_is_silent() {
    for code in CombinationCode::ALL {
        assert_eq!(simulate(code, &isolated(1.0, 0.0), 0), 0, "code {code}");
    }
}

#[test]
fn one_flipped_bit_costs_one_point() {
    let code = CombinationCode::SawtoothPulse;
    let params = isolated(1.0, 0.0);
    let mut bytes: Vec<u8> = render_table(code, &params).iter().collect();
    bytes[1234] ^= 0x10;
    bytes[4000] ^= 0x81;
    let table = ReferenceTable::from_bytes(bytes).unwrap();
    assert_eq!(score(code, &params, &table), 3);
    assert_eq!(score_bounded(code, &params, &table, 2), 3);
    assert_eq!(score_bounded(code, &params, &table, 0), 1);
}
