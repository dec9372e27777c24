/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Wire codecs for the supported mount protocols. Everything here is pure
//! string/byte manipulation so the framing logic stays in one place and each
//! codec is testable without hardware.

use crate::math::angle::Angle;
use core::f64::consts::TAU;

// ---------------------------------------------------------------------------
// Meade LX-200 / Autostar: ASCII commands, sexagesimal payloads, '#' frames.

/// RA in the LX-200 high-precision format `HH:MM:SS`.
pub fn format_lx200_ra(ra: Angle) -> String {
    let hms = ra.mod_2pi().to_hms();
    format!("{:02}:{:02}:{:02.0}", hms.hour, hms.min, hms.sec.floor())
}

/// Dec in the LX-200 high-precision format `sDD*MM:SS`.
pub fn format_lx200_dec(dec: Angle) -> String {
    let dms = dec.to_dms();
    format!(
        "{}{:02}*{:02}:{:02.0}",
        dms.sign,
        dms.deg,
        dms.min,
        dms.sec.floor()
    )
}

/// Parses `HH:MM:SS#` or the low-precision `HH:MM.T#`.
pub fn parse_lx200_ra(s: &str) -> Option<Angle> {
    let s = s.trim_end_matches('#').trim();
    let mut parts = s.split(':');
    let hour: f64 = parts.next()?.parse().ok()?;
    let rest = parts.next()?;
    if let Some(third) = parts.next() {
        let min: f64 = rest.parse().ok()?;
        let sec: f64 = third.parse().ok()?;
        Some(Angle::from_hours(hour + min / 60.0 + sec / 3600.0))
    } else {
        // Low precision: minutes with a decimal tenth.
        let min: f64 = rest.parse().ok()?;
        Some(Angle::from_hours(hour + min / 60.0))
    }
}

/// Parses `sDD*MM'SS#`, `sDD*MM#`, and the ASCII-degree variant some
/// firmware emits.
pub fn parse_lx200_dec(s: &str) -> Option<Angle> {
    let s = s.trim_end_matches('#').trim();
    let (sign, rest) = match s.as_bytes().first()? {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    // The degree separator arrives as '*', the raw 0xDF byte (lossy-decoded
    // to U+FFFD), or ':' depending on firmware.
    let mut parts =
        rest.split(|c: char| c == '*' || c == '\u{df}' || c == '\u{fffd}' || c == ':' || c == '\'');
    let deg: f64 = parts.next()?.trim().parse().ok()?;
    let min: f64 = parts.next()?.trim().parse().ok()?;
    let sec: f64 = match parts.next() {
        Some(sec) if !sec.trim().is_empty() => sec.trim().parse().ok()?,
        _ => 0.0,
    };
    Some(Angle::from_degrees(sign * (deg + min / 60.0 + sec / 3600.0)))
}

// ---------------------------------------------------------------------------
// Celestron NexStar / StarSense / SynScan: 32-bit hex fractions of a turn.

/// Encodes an angle as a 32-bit fraction of a full rotation.
pub fn nexstar_hex(angle: Angle) -> u32 {
    (angle.mod_2pi().as_radians() / TAU * 4_294_967_296.0) as i64 as u32
}

/// Decodes a 32-bit fraction of a full rotation.
pub fn nexstar_angle(hex: u32) -> Angle {
    Angle::from_radians(f64::from(hex) / 4_294_967_296.0 * TAU)
}

/// Decodes a NexStar declination fraction, unwrapping the quadrant so that
/// values past a pole come back as proper signed declinations.
pub fn nexstar_dec(hex: u32) -> Angle {
    let dec = nexstar_angle(hex).as_radians();
    let quadrant = (0xC000_0000_u32 & hex) >> 16;
    let dec = match quadrant {
        0x4000 => dec - TAU / 4.0,       // crossed the north pole
        0x8000 => -(dec - TAU / 2.0),    // southern hemisphere
        0xC000 => dec - TAU,             // crossed the south pole
        _ => dec,
    };
    Angle::from_radians(dec)
}

/// Parses the `e` response `XXXXXXXX,YYYYYYYY#` into RA/Dec.
pub fn parse_nexstar_radec(s: &str) -> Option<(Angle, Angle)> {
    let s = s.trim_end_matches('#');
    let (ra_hex, dec_hex) = s.split_once(',')?;
    if ra_hex.len() != 8 || dec_hex.len() != 8 {
        return None;
    }
    let ra = u32::from_str_radix(ra_hex, 16).ok()?;
    let dec = u32::from_str_radix(dec_hex, 16).ok()?;
    Some((nexstar_angle(ra), nexstar_dec(dec)))
}

/// Builds the `r`/`s` GoTo and sync payloads.
pub fn format_nexstar_radec(cmd: char, ra: Angle, dec: Angle) -> String {
    format!("{cmd}{:08X},{:08X}", nexstar_hex(ra), nexstar_hex(dec))
}

/// Builds the 8-byte variable-rate slew command for one axis.
/// `rate` 0 stops the axis; positive rates move up/right, negative down/left.
pub fn nexstar_axis_slew(axis_alt_dec: bool, rate: i32) -> [u8; 8] {
    [
        b'P',
        2,
        if axis_alt_dec { 17 } else { 16 },
        if rate >= 0 { 36 } else { 37 },
        rate.unsigned_abs().min(9) as u8,
        0,
        0,
        0,
    ]
}

/// Parses a NexStar firmware reply (2 version bytes, optionally `#`).
pub fn parse_nexstar_version(reply: &[u8]) -> Option<String> {
    if reply.len() < 2 {
        return None;
    }
    Some(format!("{}.{}", reply[0], reply[1]))
}

/// SynScan versions are three hex byte pairs: `042507#` is 4.37.7.
pub fn parse_synscan_version(reply: &str) -> Option<String> {
    let s = reply.trim_end_matches('#');
    if s.len() < 6 {
        return None;
    }
    let major = u8::from_str_radix(&s[0..2], 16).ok()?;
    let minor = u8::from_str_radix(&s[2..4], 16).ok()?;
    let patch = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(format!("{major}.{minor}.{patch}"))
}

// ---------------------------------------------------------------------------
// Synta Direct (EQMOD/EQDIR): motor-controller commands.
//
// Frames are `:` + command letter + axis digit + hex payload + '\r'; replies
// are `=` + hex payload + '\r' on success or `!` + error code on failure.
// 24-bit values are hex with the bytes swapped low-first: 0x563412 is sent
// as "123456".

/// Step count of one full revolution represented in the 24-bit position
/// registers, offset so that 0x800000 is the zero position.
pub const SYNTA_POSITION_OFFSET: i64 = 0x80_0000;

/// Builds a Synta motor command for axis 1 or 2.
pub fn synta_command(cmd: char, axis: u8, payload: &str) -> String {
    format!(":{cmd}{axis}{payload}\r")
}

/// Encodes a 24-bit value in the byte-swapped hex convention.
pub fn synta_encode_u24(value: u32) -> String {
    let value = value & 0xFF_FFFF;
    format!(
        "{:02X}{:02X}{:02X}",
        value & 0xFF,
        (value >> 8) & 0xFF,
        (value >> 16) & 0xFF
    )
}

/// Decodes a Synta hex payload: 2, 4, or 6 digits are byte-swapped values;
/// 1 or 3 digits (status words) decode directly.
pub fn synta_decode_hex(payload: &str) -> Option<u32> {
    let payload = payload.trim_end_matches('\r');
    match payload.len() {
        1 | 3 => u32::from_str_radix(payload, 16).ok(),
        2 => u32::from_str_radix(payload, 16).ok(),
        4 => {
            let lo = u32::from_str_radix(&payload[0..2], 16).ok()?;
            let hi = u32::from_str_radix(&payload[2..4], 16).ok()?;
            Some(hi << 8 | lo)
        }
        6 => {
            let lo = u32::from_str_radix(&payload[0..2], 16).ok()?;
            let mid = u32::from_str_radix(&payload[2..4], 16).ok()?;
            let hi = u32::from_str_radix(&payload[4..6], 16).ok()?;
            Some(hi << 16 | mid << 8 | lo)
        }
        _ => None,
    }
}

/// Extracts the payload from a Synta reply, or `None` on an error frame.
pub fn synta_reply_payload(reply: &str) -> Option<&str> {
    let reply = reply.trim_end_matches('\r');
    reply.strip_prefix('=')
}

/// Converts an encoder step count to an angle for a given
/// counts-per-revolution.
pub fn synta_steps_to_angle(steps: i64, counts_per_rev: i64) -> Angle {
    Angle::from_radians(TAU * (steps - SYNTA_POSITION_OFFSET) as f64 / counts_per_rev as f64)
}

/// Converts an angle to an encoder step count.
pub fn synta_angle_to_steps(angle: Angle, counts_per_rev: i64) -> i64 {
    (angle.mod_pi().as_radians() / TAU * counts_per_rev as f64) as i64 + SYNTA_POSITION_OFFSET
}

// ---------------------------------------------------------------------------
// Celestron AUX bus: binary packets with source/destination IDs and a
// checksum.

/// Known AUX bus device identifiers.
pub mod aux_device {
    pub const MAIN_BOARD: u8 = 0x01;
    pub const NEXSTAR_HC: u8 = 0x04;
    pub const AZM_MOTOR: u8 = 0x10;
    pub const ALT_MOTOR: u8 = 0x11;
    pub const CONTROL_APP: u8 = 0x20;
    pub const WIFI_LINK: u8 = 0xb3;
}

/// AUX bus command identifiers.
pub mod aux_command {
    pub const MC_GET_POSITION: u8 = 0x01;
    pub const MC_GOTO_FAST: u8 = 0x02;
    pub const MC_SET_POSITION: u8 = 0x04;
    pub const MC_GOTO_DONE: u8 = 0x13;
    pub const MC_GOTO_SLOW: u8 = 0x17;
    pub const MC_MOVE_POSITIVE: u8 = 0x24;
    pub const MC_MOVE_NEGATIVE: u8 = 0x25;
    pub const GET_VERSION: u8 = 0xfe;
}

/// Steps per radian of the 24-bit AUX position registers.
pub const AUX_STEPS_PER_RAD: f64 = 16_777_216.0 / TAU;

/// Builds an AUX packet: preamble, length, source, destination, command,
/// data, checksum.
pub fn aux_packet(cmd: u8, data: &[u8], src: u8, dst: u8) -> Vec<u8> {
    let mut packet = Vec::with_capacity(data.len() + 6);
    packet.push(0x3B);
    packet.push((data.len() + 3) as u8);
    packet.push(src);
    packet.push(dst);
    packet.push(cmd);
    packet.extend_from_slice(data);
    packet.push(aux_checksum(&packet[1..]));
    packet
}

/// The AUX checksum: two's complement of the byte sum from the length byte
/// through the data.
pub fn aux_checksum(body: &[u8]) -> u8 {
    let sum: u32 = body.iter().map(|&b| u32::from(b)).sum();
    (sum as u8).wrapping_neg()
}

/// A decoded AUX packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuxPacket {
    pub src: u8,
    pub dst: u8,
    pub cmd: u8,
    pub data: Vec<u8>,
}

/// Parses and checksum-verifies one AUX packet from a byte stream that
/// begins at the 0x3B preamble.
pub fn parse_aux_packet(bytes: &[u8]) -> Option<AuxPacket> {
    if bytes.len() < 6 || bytes[0] != 0x3B {
        return None;
    }
    let len = bytes[1] as usize;
    // len counts src, dst, cmd, and data.
    if bytes.len() < len + 3 {
        return None;
    }
    let body = &bytes[1..len + 2];
    let checksum = bytes[len + 2];
    if aux_checksum(body) != checksum {
        return None;
    }
    Some(AuxPacket {
        src: bytes[2],
        dst: bytes[3],
        cmd: bytes[4],
        data: bytes[5..len + 2].to_vec(),
    })
}

/// Converts a signed 24-bit fraction of a rotation to an angle.
pub fn aux_position_to_angle(data: &[u8]) -> Option<Angle> {
    if data.len() < 3 {
        return None;
    }
    let raw = (i32::from(data[0]) << 16) | (i32::from(data[1]) << 8) | i32::from(data[2]);
    // Sign-extend 24 bits.
    let raw = (raw << 8) >> 8;
    Some(Angle::from_radians(f64::from(raw) / AUX_STEPS_PER_RAD))
}

/// Converts an angle to the 24-bit big-endian position payload.
pub fn aux_angle_to_position(angle: Angle) -> [u8; 3] {
    let steps = (angle.mod_pi().as_radians() * AUX_STEPS_PER_RAD) as i32;
    [
        ((steps >> 16) & 0xFF) as u8,
        ((steps >> 8) & 0xFF) as u8,
        (steps & 0xFF) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[test]
    fn lx200_ra_round_trip() {
        let ra = Angle::from_hours(6.0 + 45.0 / 60.0 + 9.0 / 3600.0);
        let s = format_lx200_ra(ra);
        assert_eq!(s, "06:45:09");
        let back = parse_lx200_ra(&format!("{s}#")).unwrap();
        assert_abs_diff_eq!(back.to_hours(), ra.to_hours(), epsilon = 1.0 / 3600.0);
    }

    #[rstest]
    #[case("-16*43:54#", -16.731_666)]
    #[case("+09*50:45#", 9.845_833)]
    #[case("-05*30#", -5.5)]
    fn lx200_dec_parsing(#[case] wire: &str, #[case] expect_deg: f64) {
        let dec = parse_lx200_dec(wire).unwrap();
        assert_abs_diff_eq!(dec.to_degrees(), expect_deg, epsilon = 1e-4);
    }

    #[test]
    fn lx200_dec_formats_negative_zero_degrees() {
        let s = format_lx200_dec(Angle::from_degrees(-0.51));
        assert!(s.starts_with("-00*30"), "{s}");
    }

    #[test]
    fn lx200_low_precision_ra() {
        let ra = parse_lx200_ra("06:45.2#").unwrap();
        assert_abs_diff_eq!(ra.to_hours(), 6.0 + 45.2 / 60.0, epsilon = 1e-9);
    }

    #[test]
    fn nexstar_fraction_round_trip() {
        for hours in [0.0, 6.75, 12.0, 23.99] {
            let ra = Angle::from_hours(hours);
            let back = nexstar_angle(nexstar_hex(ra));
            assert_abs_diff_eq!(
                back.to_hours(),
                hours,
                epsilon = 24.0 / 4_294_967_296.0 * 2.0
            );
        }
    }

    #[test]
    fn nexstar_radec_response_parsing() {
        // RA = 90° = 0x40000000; Dec = 45° = 0x20000000.
        let (ra, dec) = parse_nexstar_radec("40000000,20000000#").unwrap();
        assert_abs_diff_eq!(ra.to_degrees(), 90.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dec.to_degrees(), 45.0, epsilon = 1e-6);
    }

    #[test]
    fn nexstar_southern_declination_unwraps() {
        // -20° encodes as 340° of rotation: 0xF1C71C72-ish. 340/360*2^32:
        let hex = (340.0 / 360.0 * 4_294_967_296.0) as u64 as u32;
        let dec = nexstar_dec(hex);
        assert_abs_diff_eq!(dec.to_degrees(), -20.0, epsilon = 1e-5);
    }

    #[test]
    fn nexstar_goto_payload_shape() {
        let s = format_nexstar_radec('r', Angle::from_degrees(90.0), Angle::from_degrees(45.0));
        assert_eq!(s, "r40000000,20000000");
    }

    #[test]
    fn nexstar_axis_slew_packets() {
        assert_eq!(nexstar_axis_slew(false, 9), [b'P', 2, 16, 36, 9, 0, 0, 0]);
        assert_eq!(nexstar_axis_slew(true, -4), [b'P', 2, 17, 37, 4, 0, 0, 0]);
        assert_eq!(nexstar_axis_slew(true, 0), [b'P', 2, 17, 36, 0, 0, 0, 0]);
    }

    #[test]
    fn synscan_version_decoding() {
        assert_eq!(parse_synscan_version("042507#").unwrap(), "4.37.7");
    }

    #[test]
    fn synta_hex_is_byte_swapped() {
        assert_eq!(synta_encode_u24(0x56_3412), "123456");
        assert_eq!(synta_decode_hex("123456"), Some(0x56_3412));
        assert_eq!(synta_decode_hex("8000"), Some(0x0080));
        assert_eq!(synta_decode_hex("7F"), Some(0x7F));
    }

    #[test]
    fn synta_position_round_trip() {
        let counts = 9_024_000_i64;
        for deg in [-90.0, -15.5, 0.0, 45.0, 120.0] {
            let steps = synta_angle_to_steps(Angle::from_degrees(deg), counts);
            let back = synta_steps_to_angle(steps, counts);
            assert_abs_diff_eq!(back.to_degrees(), deg, epsilon = 1e-4);
        }
    }

    #[test]
    fn synta_command_frame() {
        assert_eq!(synta_command('j', 1, ""), ":j1\r");
        assert_eq!(synta_command('S', 2, "123456"), ":S2123456\r");
        assert_eq!(synta_reply_payload("=563412\r"), Some("563412"));
        assert_eq!(synta_reply_payload("!2\r"), None);
    }

    #[test]
    fn aux_packet_checksum_round_trip() {
        let packet = aux_packet(
            aux_command::MC_GET_POSITION,
            &[],
            aux_device::CONTROL_APP,
            aux_device::AZM_MOTOR,
        );
        assert_eq!(packet[0], 0x3B);
        assert_eq!(packet[1], 3);
        let parsed = parse_aux_packet(&packet).unwrap();
        assert_eq!(parsed.cmd, aux_command::MC_GET_POSITION);
        assert_eq!(parsed.src, aux_device::CONTROL_APP);
        assert_eq!(parsed.dst, aux_device::AZM_MOTOR);
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn aux_corrupted_checksum_is_rejected() {
        let mut packet = aux_packet(
            aux_command::MC_GOTO_FAST,
            &[0x12, 0x34, 0x56],
            aux_device::CONTROL_APP,
            aux_device::ALT_MOTOR,
        );
        let last = packet.len() - 1;
        packet[last] ^= 0xFF;
        assert!(parse_aux_packet(&packet).is_none());
    }

    #[test]
    fn aux_position_sign_extension() {
        let neg = aux_angle_to_position(Angle::from_degrees(-30.0));
        let back = aux_position_to_angle(&neg).unwrap();
        assert_abs_diff_eq!(back.to_degrees(), -30.0, epsilon = 1e-4);
        let pos = aux_angle_to_position(Angle::from_degrees(100.0));
        let back = aux_position_to_angle(&pos).unwrap();
        assert_abs_diff_eq!(back.to_degrees(), 100.0, epsilon = 1e-4);
    }
}
