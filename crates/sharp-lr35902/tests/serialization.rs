//! Snapshot types under the `serde` feature.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sharp_lr35902::{InstrStatus, Pins, Region, Registers, State};

fn round_trip<T>(value: &T) -> T
where
    T: Serialize + DeserializeOwned,
{
    let json = serde_json::to_string(value).expect("serializable");
    serde_json::from_str(&json).expect("deserializable")
}

#[test]
fn pins_serialize_by_line_name() {
    let json = serde_json::to_value(Pins::idle()).expect("serializable");
    assert_eq!(json["a"], 0x8000);
    assert_eq!(json["d"], 0);
    for line in ["rd", "wr", "cs", "phi"] {
        assert_eq!(json[line], true, "{line}");
    }
}

#[test]
fn registers_round_trip() {
    let mut regs = Registers {
        sp: 0xFFFE,
        pc: 0x0150,
        ..Registers::default()
    };
    regs.set_af(0x12F0);
    regs.set_bc(0x3456);
    regs.set_de(0x789A);
    regs.set_hl(0xBCDE);

    assert_eq!(round_trip(&regs), regs);
    let json = serde_json::to_value(regs).expect("serializable");
    assert_eq!(json["pc"], 0x0150);
    assert_eq!(json["h"], 0xBC);
}

#[test]
fn scheduler_state_round_trips() {
    for state in [State::Fetching, State::Executing, State::ExternallyDriven] {
        assert_eq!(round_trip(&state), state);
    }
    for status in [InstrStatus::Running, InstrStatus::LastCycle] {
        assert_eq!(round_trip(&status), status);
    }
}

#[test]
fn regions_round_trip() {
    for address in [0x0150, 0x8800, 0xC000, 0xFF80] {
        let region = Region::of(address);
        assert_eq!(round_trip(&region), region);
    }
}
