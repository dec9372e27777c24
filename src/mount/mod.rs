/*
 * skycore
 * Copyright (C) 2023-onward The skycore authors (cf. AUTHORS.md)
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Telescope mount control: one state machine, a protocol tag, and
//! per-protocol wire codecs.
//!
//! The dispatcher exposes a unified command surface over Meade LX-200 /
//! Autostar, Celestron NexStar / StarSense / SynScan, Synta motor
//! controllers (EQMOD/EQDIR), and the Celestron AUX bus, over TCP, UDP, or
//! serial transports. With [`MountProtocol::None`] the same surface drives a
//! software-only simulator, so every caller path is testable without
//! hardware.
//!
//! Every command exchange follows one framing contract: drain unsolicited
//! input, write the request, then read to a terminator, a byte count, or a
//! timeout. A per-mount mutex serializes all access; asynchronous calls own
//! the mutex for their whole duration, so commands from one caller complete
//! in submission order and interleaving across callers happens only at
//! command granularity.

pub mod model;
pub mod protocol;
pub mod transport;

use crate::errors::{MountError, MountResult};
use crate::frames::Coordinates;
use crate::math::angle::Angle;
use crate::math::spherical::Spherical;
use crate::time::{CalendarSystem, Time};
use bytes::BytesMut;
use log::{debug, warn};
use model::{MountModel, Sighting};
use protocol::{aux_command, aux_device};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use transport::{SerialConfig, Transport};

/// Mechanical mount families.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MountType {
    /// Dobsonians, manual alt-az forks
    AltAzimuthPush,
    /// Computer-driven alt-az mounts
    AltAzimuthGoto,
    /// Dobsonians on equatorial platforms
    EquatorialPush,
    /// Computer-driven equatorial mounts
    EquatorialGoto,
}

impl MountType {
    pub fn is_equatorial(self) -> bool {
        matches!(self, Self::EquatorialPush | Self::EquatorialGoto)
    }

    pub fn is_goto(self) -> bool {
        matches!(self, Self::AltAzimuthGoto | Self::EquatorialGoto)
    }
}

/// Mount controller protocols.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MountProtocol {
    /// No real communication: the full command surface drives a simulator.
    None,
    /// Meade LX-200 classic and LX-200GPS
    MeadeLX200,
    /// Meade Autostar and Audiostar controllers
    MeadeAutostar,
    /// Celestron NexStar and StarSense hand controllers
    CelestronNexStar,
    /// SkyWatcher and Orion SynScan controllers
    SkyWatcherSynScan,
    /// Direct Synta motor-controller interface (EQMOD, EQDIR, SynScan Wi-Fi)
    SyntaDirect,
    /// Celestron AUX packet bus (Wi-Fi Link, SkyPortal)
    CelestronAux,
}

/// Supported protocols with display names, for connection dialogs.
pub fn mount_protocols() -> &'static [(MountProtocol, &'static str)] {
    &[
        (MountProtocol::None, "Mount Simulator"),
        (MountProtocol::MeadeLX200, "Meade LX-200"),
        (MountProtocol::MeadeAutostar, "Meade Autostar"),
        (MountProtocol::CelestronNexStar, "Celestron NexStar"),
        (MountProtocol::SkyWatcherSynScan, "SkyWatcher SynScan"),
        (MountProtocol::SyntaDirect, "Synta Direct (EQMOD)"),
        (MountProtocol::CelestronAux, "Celestron AUX"),
    ]
}

/// Directional slew axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlewAxis {
    /// Azimuth or right ascension axis
    AzmRa = 0,
    /// Altitude or declination axis
    AltDec = 1,
}

/// Simulator slew rate, radians per second at the maximum rate setting.
const SIM_SLEW_RAD_PER_SEC: f64 = 4.0_f64 * core::f64::consts::PI / 180.0;

struct Inner {
    mount_type: MountType,
    protocol: MountProtocol,
    transport: Option<Transport>,
    coords: Coordinates,
    model: MountModel,

    version: String,
    connected: bool,
    aligned: bool,
    tracking: bool,
    slewing: bool,

    timeout_ms: u64,
    retries: u32,
    slew_rate: [i32; 2],

    /// Last-known-good mount-frame coordinates; kept on read failures.
    curr: (Angle, Angle),
    slew_target: Option<(Angle, Angle)>,
    /// Simulator integration clock.
    sim_last: Option<Instant>,
    /// Synta motor counts per revolution, per axis.
    counts_per_rev: [i64; 2],
    /// Synta stepping timer interrupt frequency, per axis.
    step_timer_freq: [i64; 2],
}

/// A telescope mount. Cloning shares the underlying connection and state;
/// all operations serialize on one internal mutex.
#[derive(Clone)]
pub struct Mount {
    inner: Arc<Mutex<Inner>>,
}

impl Mount {
    /// Creates a disconnected mount for the given mechanical type and
    /// protocol. The frame bundle provides the observer site, the current
    /// time, and the precession context for coordinate negotiation.
    pub fn new(mount_type: MountType, protocol: MountProtocol, coords: Coordinates) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                mount_type,
                protocol,
                transport: None,
                coords,
                model: MountModel::new(),
                version: String::new(),
                connected: false,
                aligned: false,
                tracking: false,
                slewing: false,
                timeout_ms: 1_000,
                retries: 2,
                slew_rate: [0, 0],
                curr: (Angle::ZERO, Angle::ZERO),
                slew_target: None,
                sim_last: None,
                counts_per_rev: [9_024_000, 9_024_000],
                step_timer_freq: [64_935, 64_935],
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A caller panicking mid-command leaves no partial protocol state
        // beyond what the next drain step clears.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mount_type(&self) -> MountType {
        self.lock().mount_type
    }

    pub fn protocol(&self) -> MountProtocol {
        self.lock().protocol
    }

    pub fn version(&self) -> String {
        self.lock().version.clone()
    }

    pub fn connected(&self) -> bool {
        self.lock().connected
    }

    pub fn max_slew_rate(&self) -> i32 {
        max_slew_rate(self.lock().protocol)
    }

    /// The last rate commanded on an axis (0 when stopped).
    pub fn slew_rate(&self, axis: SlewAxis) -> i32 {
        self.lock().slew_rate[axis as usize]
    }

    pub fn set_timeout(&self, millis: u64) {
        self.lock().timeout_ms = millis;
    }

    pub fn timeout(&self) -> u64 {
        self.lock().timeout_ms
    }

    pub fn set_retries(&self, attempts: u32) {
        self.lock().retries = attempts;
    }

    pub fn retries(&self) -> u32 {
        self.lock().retries
    }

    /// Replaces the frame bundle (site moved, time advanced substantially).
    pub fn set_coordinates(&self, coords: Coordinates) {
        self.lock().coords = coords;
    }

    /// Opens the connection: TCP (or UDP with `udp`) when `port` is nonzero,
    /// otherwise a serial device at `path`. Switching transports requires a
    /// disconnect first.
    pub fn connect(&self, path: &str, port: u16) -> MountResult<()> {
        self.connect_with(path, port, false)
    }

    pub fn connect_with(&self, path: &str, port: u16, udp: bool) -> MountResult<()> {
        let mut inner = self.lock();
        if inner.connected {
            inner.disconnect()?;
        }
        inner.connect(path, port, udp)
    }

    pub fn disconnect(&self) -> MountResult<()> {
        self.lock().disconnect()
    }

    /// Reads the mount's current position, as fundamental J2000 RA/Dec.
    pub fn read(&self) -> MountResult<(Angle, Angle)> {
        self.lock().read()
    }

    /// Starts a GoTo slew to fundamental J2000 RA/Dec at the fastest rate.
    pub fn slew_to(&self, ra: Angle, dec: Angle) -> MountResult<()> {
        self.lock().slew_to(ra, dec)
    }

    /// Starts or stops slewing one axis at a signed rate (0 stops the axis).
    pub fn slew_axis(&self, axis: SlewAxis, rate: i32) -> MountResult<()> {
        self.lock().slew_axis(axis, rate)
    }

    /// Stops any in-progress GoTo and axis motion. This is the only way to
    /// interrupt a GoTo; it is accepted while one is running.
    pub fn stop(&self) -> MountResult<()> {
        self.lock().stop()
    }

    /// Aligns the mount on the given fundamental J2000 coordinates.
    pub fn sync_to(&self, ra: Angle, dec: Angle) -> MountResult<()> {
        self.lock().sync_to(ra, dec)
    }

    /// Whether a GoTo slew is currently in progress (queried from the mount).
    pub fn is_slewing(&self) -> MountResult<bool> {
        self.lock().is_slewing()
    }

    /// Whether the mount's star alignment is complete.
    pub fn is_aligned(&self) -> MountResult<bool> {
        self.lock().is_aligned()
    }

    pub fn is_tracking(&self) -> MountResult<bool> {
        self.lock().is_tracking()
    }

    pub fn set_tracking(&self, on: bool) -> MountResult<()> {
        self.lock().set_tracking(on)
    }

    /// Sends local date, time, and zone to the mount.
    pub fn set_time(&self, time: Time) -> MountResult<()> {
        self.lock().set_time(time)
    }

    /// Sends site longitude and latitude to the mount.
    pub fn set_site(&self, site: Spherical) -> MountResult<()> {
        self.lock().set_site(site)
    }

    pub fn get_time(&self) -> MountResult<Time> {
        self.lock().get_time()
    }

    pub fn get_site(&self) -> MountResult<Spherical> {
        self.lock().get_site()
    }

    /// Sends the bundle's time and site to the mount.
    pub fn push_time_and_site(&self) -> MountResult<()> {
        let mut inner = self.lock();
        let time = inner.coords.time();
        let site = inner.coords.location();
        inner.set_time(time)?;
        inner.set_site(site)
    }

    // Asynchronous variants: each owns the mutex for its whole duration, so
    // a caller's submissions complete in order and never interleave inside
    // a command.

    pub fn read_async<F>(&self, callback: F)
    where
        F: FnOnce(MountResult<(Angle, Angle)>) + Send + 'static,
    {
        let mount = self.clone();
        thread::spawn(move || callback(mount.read()));
    }

    pub fn slew_to_async<F>(&self, ra: Angle, dec: Angle, callback: F)
    where
        F: FnOnce(MountResult<()>) + Send + 'static,
    {
        let mount = self.clone();
        thread::spawn(move || callback(mount.slew_to(ra, dec)));
    }

    pub fn slew_axis_async<F>(&self, axis: SlewAxis, rate: i32, callback: F)
    where
        F: FnOnce(MountResult<()>) + Send + 'static,
    {
        let mount = self.clone();
        thread::spawn(move || callback(mount.slew_axis(axis, rate)));
    }

    pub fn stop_async<F>(&self, callback: F)
    where
        F: FnOnce(MountResult<()>) + Send + 'static,
    {
        let mount = self.clone();
        thread::spawn(move || callback(mount.stop()));
    }

    pub fn sync_async<F>(&self, ra: Angle, dec: Angle, callback: F)
    where
        F: FnOnce(MountResult<()>) + Send + 'static,
    {
        let mount = self.clone();
        thread::spawn(move || callback(mount.sync_to(ra, dec)));
    }

    #[cfg(test)]
    pub(crate) fn with_mock_transport(
        mount_type: MountType,
        protocol: MountProtocol,
        coords: Coordinates,
        responses: &[u8],
    ) -> Self {
        let mount = Self::new(mount_type, protocol, coords);
        {
            let mut inner = mount.lock();
            inner.transport = Some(Transport::mock(responses));
            inner.connected = true;
            inner.version = "4.20".into();
        }
        mount
    }

    #[cfg(test)]
    pub(crate) fn written_bytes(&self) -> Vec<u8> {
        self.lock()
            .transport
            .as_ref()
            .map(|t| t.written().to_vec())
            .unwrap_or_default()
    }
}

fn max_slew_rate(protocol: MountProtocol) -> i32 {
    match protocol {
        MountProtocol::MeadeAutostar => 3,
        MountProtocol::CelestronNexStar
        | MountProtocol::SkyWatcherSynScan
        | MountProtocol::CelestronAux => 9,
        _ => 4,
    }
}

impl Inner {
    // -- connection lifecycle ------------------------------------------------

    fn connect(&mut self, path: &str, port: u16, udp: bool) -> MountResult<()> {
        if self.protocol == MountProtocol::None {
            self.connected = true;
            self.aligned = true;
            self.tracking = true;
            self.version = "1.0".into();
            self.sim_last = Some(Instant::now());
            return Ok(());
        }

        let transport = if port != 0 {
            if udp {
                Transport::open_udp(path, port)?
            } else {
                Transport::open_tcp(path, port, 2_000)?
            }
        } else {
            #[cfg(feature = "serial")]
            {
                Transport::open_serial(path, SerialConfig { baud: 9_600 })?
            }
            #[cfg(not(feature = "serial"))]
            {
                let _ = SerialConfig::default();
                return Err(MountError::NotSupported);
            }
        };
        self.transport = Some(transport);
        self.connected = true;

        match self.handshake() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.disconnect().ok();
                Err(err)
            }
        }
    }

    fn disconnect(&mut self) -> MountResult<()> {
        self.transport = None;
        self.connected = false;
        self.slewing = false;
        self.sim_last = None;
        Ok(())
    }

    /// Protocol-specific identification exchange after the transport opens.
    fn handshake(&mut self) -> MountResult<()> {
        match self.protocol {
            MountProtocol::None => Ok(()),
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                // ACK query returns the alignment mode character.
                let reply = self.command(&[0x06], 1, None, None)?;
                self.aligned = matches!(reply.first(), Some(b'A') | Some(b'P') | Some(b'G'));
                // Autostars report a firmware string; classics may not.
                if let Ok(version) = self.command(b":GVN#", 32, Some(b'#'), None) {
                    self.version = text(&version).trim_end_matches('#').trim().to_string();
                }
                Ok(())
            }
            MountProtocol::CelestronNexStar => {
                let reply = self.command(b"V#", 3, None, None)?;
                self.version = protocol::parse_nexstar_version(&reply)
                    .ok_or(MountError::InvalidOutput)?;
                // Pre-4.0 versions may be a renumbered StarSense controller;
                // it answers the platform query, and we shift its version by
                // ten to keep the epoch logic in one place.
                if version_number(&self.version) < 4.0 {
                    if let Ok(reply) = self.command(b"v#", 3, Some(b'#'), None) {
                        if reply.len() >= 2 {
                            self.version = format!("1{}.{}", reply[0], reply[1]);
                        }
                    }
                }
                Ok(())
            }
            MountProtocol::SkyWatcherSynScan => {
                let reply = self.command(b"V#", 7, Some(b'#'), None)?;
                self.version = protocol::parse_synscan_version(&text(&reply))
                    .ok_or(MountError::InvalidOutput)?;
                Ok(())
            }
            MountProtocol::SyntaDirect => {
                for axis in [0_usize, 1] {
                    let reply = self.synta_command('e', axis as u8 + 1, "")?;
                    if self.version.is_empty() {
                        self.version = format!("{:06X}", reply);
                    }
                    let counts = self.synta_command('a', axis as u8 + 1, "")?;
                    if counts == 0 {
                        return Err(MountError::InvalidOutput);
                    }
                    self.counts_per_rev[axis] = i64::from(counts);
                    let freq = self.synta_command('b', axis as u8 + 1, "")?;
                    if freq != 0 {
                        self.step_timer_freq[axis] = i64::from(freq);
                    }
                }
                Ok(())
            }
            MountProtocol::CelestronAux => {
                let reply = self.aux_command(
                    aux_command::GET_VERSION,
                    aux_device::AZM_MOTOR,
                    &[],
                )?;
                if reply.len() >= 2 {
                    self.version = format!("{}.{}", reply[0], reply[1]);
                }
                Ok(())
            }
        }
    }

    // -- command framing -----------------------------------------------------

    /// One command exchange: drain, write, read to terminator/length/timeout.
    fn command(
        &mut self,
        input: &[u8],
        resp_len: usize,
        term: Option<u8>,
        timeout_override: Option<u64>,
    ) -> MountResult<BytesMut> {
        let timeout = timeout_override.unwrap_or(self.timeout_ms);
        let transport = self.transport.as_mut().ok_or(MountError::InvalidInput)?;

        transport.drain()?;
        if !input.is_empty() {
            transport.write_all(input)?;
        }
        if resp_len == 0 {
            return Ok(BytesMut::new());
        }
        transport.read_until(term, resp_len, timeout)
    }

    /// A query command retried up to the configured attempt count. Only
    /// idempotent queries go through here; state-changing commands are
    /// attempted exactly once.
    fn query(
        &mut self,
        input: &[u8],
        resp_len: usize,
        term: Option<u8>,
    ) -> MountResult<BytesMut> {
        let attempts = self.retries.max(1);
        let mut last = MountError::TimedOut;
        for attempt in 0..attempts {
            match self.command(input, resp_len, term, None) {
                Ok(reply) => return Ok(reply),
                Err(err) => {
                    debug!("query attempt {attempt} failed: {err}");
                    last = err;
                }
            }
        }
        Err(last)
    }

    /// Synta motor exchange returning the decoded hex payload.
    fn synta_command(&mut self, cmd: char, axis: u8, payload: &str) -> MountResult<u32> {
        let frame = protocol::synta_command(cmd, axis, payload);
        let reply = self.command(frame.as_bytes(), 16, Some(b'\r'), None)?;
        let reply = text(&reply);
        match protocol::synta_reply_payload(&reply) {
            Some("") => Ok(0),
            Some(payload) => {
                protocol::synta_decode_hex(payload).ok_or(MountError::InvalidOutput)
            }
            None => Err(MountError::InvalidOutput),
        }
    }

    /// AUX bus exchange: sends one packet and reads the matching response,
    /// skipping any echo of our own transmission.
    fn aux_command(&mut self, cmd: u8, dst: u8, data: &[u8]) -> MountResult<Vec<u8>> {
        let packet = protocol::aux_packet(cmd, data, aux_device::CONTROL_APP, dst);
        self.command(&packet, 0, None, None)?;

        let transport = self.transport.as_mut().ok_or(MountError::InvalidInput)?;
        // Responses are preamble-framed; read header then the body.
        for _ in 0..4 {
            let head = transport.read_until(None, 2, self.timeout_ms)?;
            if head.len() < 2 || head[0] != 0x3B {
                continue;
            }
            let len = head[1] as usize;
            let rest = transport.read_until(None, len + 1, self.timeout_ms)?;
            let mut full = Vec::with_capacity(len + 3);
            full.extend_from_slice(&head);
            full.extend_from_slice(&rest);
            if let Some(parsed) = protocol::parse_aux_packet(&full) {
                // Skip the bus echo of our own packet.
                if parsed.src == aux_device::CONTROL_APP {
                    continue;
                }
                if parsed.cmd == cmd {
                    return Ok(parsed.data);
                }
            } else {
                return Err(MountError::InvalidOutput);
            }
        }
        Err(MountError::InvalidOutput)
    }

    // -- coordinate negotiation ----------------------------------------------

    /// Converts fundamental J2000 RA/Dec to the mount's native frame.
    fn fundamental_to_mount(&self, ra: Angle, dec: Angle) -> (Angle, Angle) {
        let fun = Spherical::new(ra, dec, 1.0);
        match self.protocol {
            // NexStar firmware 4.18 and later speaks current-epoch
            // coordinates; older firmware and SynScan speak J2000.
            MountProtocol::CelestronNexStar if version_number(&self.version) > 4.175 => {
                let equ = self.coords.to_equatorial_spherical(fun);
                (equ.lon.mod_2pi(), equ.lat)
            }
            // Encoder-level protocols live in the horizon frame.
            MountProtocol::SyntaDirect | MountProtocol::CelestronAux => {
                let hor = self.coords.to_horizon_spherical(fun);
                (hor.lon.mod_2pi(), hor.lat)
            }
            _ => (ra.mod_2pi(), dec),
        }
    }

    /// Converts mount-native coordinates back to fundamental J2000 RA/Dec.
    fn mount_to_fundamental(&self, lon: Angle, lat: Angle) -> (Angle, Angle) {
        let native = Spherical::new(lon, lat, 1.0);
        match self.protocol {
            MountProtocol::CelestronNexStar if version_number(&self.version) > 4.175 => {
                let fun = self.coords.from_equatorial_spherical(native);
                (fun.lon.mod_2pi(), fun.lat)
            }
            MountProtocol::SyntaDirect | MountProtocol::CelestronAux => {
                let fun = self.coords.from_horizon_spherical(native);
                (fun.lon.mod_2pi(), fun.lat)
            }
            _ => (lon.mod_2pi(), lat),
        }
    }

    /// Maps encoder angles through the alignment model when it is solved,
    /// otherwise treats the encoders as direct horizon coordinates.
    fn encoders_to_horizon(&self, x: Angle, y: Angle) -> (Angle, Angle) {
        match self
            .model
            .encoders_to_celestial(x.as_radians(), y.as_radians())
        {
            Ok((az, alt)) => (Angle::from_radians(az), Angle::from_radians(alt)),
            Err(_) => (x.mod_2pi(), y),
        }
    }

    fn horizon_to_encoders(&self, az: Angle, alt: Angle) -> (Angle, Angle) {
        match self
            .model
            .celestial_to_encoders(az.as_radians(), alt.as_radians())
        {
            Ok((x, y)) => (Angle::from_radians(x), Angle::from_radians(y)),
            Err(_) => (az, alt),
        }
    }

    // -- simulator -----------------------------------------------------------

    /// Advances the simulated mount toward its GoTo target.
    fn sim_step(&mut self) {
        let Some(last) = self.sim_last else {
            return;
        };
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        self.sim_last = Some(now);

        if let Some((target_lon, target_lat)) = self.slew_target {
            let step = SIM_SLEW_RAD_PER_SEC * dt;
            let dlon = (target_lon - self.curr.0).mod_pi().as_radians();
            let dlat = (target_lat - self.curr.1).as_radians();
            if dlon.abs() <= step && dlat.abs() <= step {
                self.curr = (target_lon, target_lat);
                self.slew_target = None;
                self.slewing = false;
            } else {
                self.curr.0 =
                    (self.curr.0 + Angle::from_radians(dlon.clamp(-step, step))).mod_2pi();
                self.curr.1 += Angle::from_radians(dlat.clamp(-step, step));
            }
        }
    }

    // -- high-level operations -----------------------------------------------

    fn read(&mut self) -> MountResult<(Angle, Angle)> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        let native = match self.protocol {
            MountProtocol::None => {
                self.sim_step();
                self.curr
            }
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                let ra_reply = self.query(b":GR#", 16, Some(b'#'))?;
                let dec_reply = self.query(b":GD#", 16, Some(b'#'))?;
                let ra = protocol::parse_lx200_ra(&text(&ra_reply))
                    .ok_or(MountError::InvalidOutput)?;
                let dec = protocol::parse_lx200_dec(&text(&dec_reply))
                    .ok_or(MountError::InvalidOutput)?;
                (ra, dec)
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let reply = self.query(b"e", 18, Some(b'#'))?;
                let reply = text(&reply);
                if reply.len() < 18 {
                    return Err(MountError::InvalidOutput);
                }
                protocol::parse_nexstar_radec(&reply).ok_or(MountError::InvalidOutput)?
            }
            MountProtocol::SyntaDirect => {
                let x = self.synta_command('j', 1, "")?;
                let y = self.synta_command('j', 2, "")?;
                let x = protocol::synta_steps_to_angle(i64::from(x), self.counts_per_rev[0]);
                let y = protocol::synta_steps_to_angle(i64::from(y), self.counts_per_rev[1]);
                self.encoders_to_horizon(x, y)
            }
            MountProtocol::CelestronAux => {
                let azm = self.aux_command(
                    aux_command::MC_GET_POSITION,
                    aux_device::AZM_MOTOR,
                    &[],
                )?;
                let alt = self.aux_command(
                    aux_command::MC_GET_POSITION,
                    aux_device::ALT_MOTOR,
                    &[],
                )?;
                let x = protocol::aux_position_to_angle(&azm)
                    .ok_or(MountError::InvalidOutput)?;
                let y = protocol::aux_position_to_angle(&alt)
                    .ok_or(MountError::InvalidOutput)?;
                self.encoders_to_horizon(x, y)
            }
        };

        // A successful read refreshes the cached mount-frame position; a
        // failed read above left the previous value in place.
        self.curr = native;
        Ok(self.mount_to_fundamental(native.0, native.1))
    }

    fn slew_to(&mut self, ra: Angle, dec: Angle) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        if !self.mount_type.is_goto() {
            return Err(MountError::NotSupported);
        }
        if dec.as_radians().abs() > core::f64::consts::FRAC_PI_2 + 1e-9 {
            return Err(MountError::InvalidCoords);
        }
        let (lon, lat) = self.fundamental_to_mount(ra, dec);

        match self.protocol {
            MountProtocol::None => {
                self.slew_target = Some((lon, lat));
                self.slewing = true;
                self.sim_last = Some(Instant::now());
                Ok(())
            }
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                // Set target RA, target Dec, then slew; each setter answers
                // '0' (rejected) or '1' (accepted) with no terminator.
                let ra_cmd = format!(":Sr{}#", protocol::format_lx200_ra(lon));
                let reply = self.command(ra_cmd.as_bytes(), 1, None, None)?;
                if reply.first() != Some(&b'1') {
                    return Err(MountError::InvalidCoords);
                }
                let dec_cmd = format!(":Sd{}#", protocol::format_lx200_dec(lat));
                let reply = self.command(dec_cmd.as_bytes(), 1, None, None)?;
                if reply.first() != Some(&b'1') {
                    return Err(MountError::InvalidCoords);
                }
                let reply = self.command(b":MS#", 1, None, None)?;
                match reply.first() {
                    Some(b'0') => {
                        self.slewing = true;
                        Ok(())
                    }
                    _ => {
                        // An error is followed by a text message; clear it.
                        self.command(&[], 64, Some(b'#'), Some(200)).ok();
                        Err(MountError::InvalidCoords)
                    }
                }
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                // Old hand controllers are notoriously slow on GoTo; use a
                // long timeout and never retry.
                let cmd = protocol::format_nexstar_radec('r', lon, lat);
                self.command(cmd.as_bytes(), 1, Some(b'#'), Some(5_000))?;
                self.slewing = true;
                Ok(())
            }
            MountProtocol::SyntaDirect => {
                let (x, y) = self.horizon_to_encoders(lon, lat);
                for (axis, angle) in [(1_u8, x), (2_u8, y)] {
                    let steps = protocol::synta_angle_to_steps(
                        angle,
                        self.counts_per_rev[(axis - 1) as usize],
                    );
                    let payload = protocol::synta_encode_u24(steps as u32);
                    // Motion mode: GoTo fast, then target, then start.
                    self.synta_command('G', axis, "00")?;
                    self.synta_command('S', axis, &payload)?;
                    self.synta_command('J', axis, "")?;
                }
                self.slewing = true;
                Ok(())
            }
            MountProtocol::CelestronAux => {
                let (x, y) = self.horizon_to_encoders(lon, lat);
                self.aux_command(
                    aux_command::MC_GOTO_FAST,
                    aux_device::AZM_MOTOR,
                    &protocol::aux_angle_to_position(x),
                )?;
                self.aux_command(
                    aux_command::MC_GOTO_FAST,
                    aux_device::ALT_MOTOR,
                    &protocol::aux_angle_to_position(y),
                )?;
                self.slewing = true;
                Ok(())
            }
        }
    }

    fn slew_axis(&mut self, axis: SlewAxis, rate: i32) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        if rate.abs() > max_slew_rate(self.protocol) {
            return Err(MountError::InvalidInput);
        }
        let result = match self.protocol {
            MountProtocol::None => Ok(()),
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                // Select the rate class, then start or stop the motion.
                let rate_cmd: &[u8] = match rate.abs() {
                    0 | 1 => b":RG#",
                    2 => b":RC#",
                    3 => b":RM#",
                    _ => b":RS#",
                };
                self.command(rate_cmd, 0, None, None)?;
                let motion: &[u8] = match (axis, rate.signum()) {
                    (SlewAxis::AzmRa, 0) => b":Qe#",
                    (SlewAxis::AzmRa, 1) => b":Me#",
                    (SlewAxis::AzmRa, _) => b":Mw#",
                    (SlewAxis::AltDec, 0) => b":Qn#",
                    (SlewAxis::AltDec, 1) => b":Mn#",
                    (SlewAxis::AltDec, _) => b":Ms#",
                };
                self.command(motion, 0, None, None)?;
                Ok(())
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let packet = protocol::nexstar_axis_slew(axis == SlewAxis::AltDec, rate);
                let reply = self.command(&packet, 1, None, None)?;
                match reply.first() {
                    Some(b'P') | Some(b'#') => Ok(()),
                    _ => Err(MountError::InvalidOutput),
                }
            }
            MountProtocol::SyntaDirect => {
                let axis_id = axis as u8 + 1;
                if rate == 0 {
                    self.synta_command('K', axis_id, "")?;
                } else {
                    // Stop, set direction mode, program the step period for
                    // the requested multiple of sidereal rate, then start.
                    let mode = if rate > 0 { "10" } else { "11" };
                    self.synta_command('K', axis_id, "")?;
                    self.synta_command('G', axis_id, mode)?;
                    let idx = (axis_id - 1) as usize;
                    let rad_per_sec = sidereal_rate_rad_s()
                        * f64::from(4_u32.pow(rate.unsigned_abs().min(9)));
                    let steps_per_sec = self.counts_per_rev[idx] as f64 * rad_per_sec
                        / core::f64::consts::TAU;
                    let period = (self.step_timer_freq[idx] as f64 / steps_per_sec)
                        .clamp(1.0, 16_777_215.0) as u32;
                    self.synta_command('I', axis_id, &protocol::synta_encode_u24(period))?;
                    self.synta_command('J', axis_id, "")?;
                }
                Ok(())
            }
            MountProtocol::CelestronAux => {
                let (cmd, dst) = match axis {
                    SlewAxis::AzmRa => (
                        if rate >= 0 {
                            aux_command::MC_MOVE_POSITIVE
                        } else {
                            aux_command::MC_MOVE_NEGATIVE
                        },
                        aux_device::AZM_MOTOR,
                    ),
                    SlewAxis::AltDec => (
                        if rate >= 0 {
                            aux_command::MC_MOVE_POSITIVE
                        } else {
                            aux_command::MC_MOVE_NEGATIVE
                        },
                        aux_device::ALT_MOTOR,
                    ),
                };
                self.aux_command(cmd, dst, &[rate.unsigned_abs().min(9) as u8])?;
                Ok(())
            }
        };
        if result.is_ok() {
            self.slew_rate[axis as usize] = rate;
        }
        result
    }

    fn stop(&mut self) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::None => {
                self.slew_target = None;
                self.slewing = false;
                Ok(())
            }
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                self.command(b":Q#", 0, None, None)?;
                self.slewing = false;
                Ok(())
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                self.command(b"M", 1, Some(b'#'), None)?;
                // SynScan firmware below 3.36 resumes motion after a stop;
                // kill both axes explicitly.
                if self.protocol == MountProtocol::SkyWatcherSynScan
                    && version_number(&self.version) < 3.355
                {
                    self.slew_axis(SlewAxis::AzmRa, 0)?;
                    self.slew_axis(SlewAxis::AltDec, 0)?;
                }
                self.slewing = false;
                Ok(())
            }
            MountProtocol::SyntaDirect => {
                self.synta_command('K', 1, "")?;
                self.synta_command('K', 2, "")?;
                self.slewing = false;
                Ok(())
            }
            MountProtocol::CelestronAux => {
                self.aux_command(aux_command::MC_MOVE_POSITIVE, aux_device::AZM_MOTOR, &[0])?;
                self.aux_command(aux_command::MC_MOVE_POSITIVE, aux_device::ALT_MOTOR, &[0])?;
                self.slewing = false;
                Ok(())
            }
        }
    }

    fn sync_to(&mut self, ra: Angle, dec: Angle) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        let (lon, lat) = self.fundamental_to_mount(ra, dec);
        match self.protocol {
            MountProtocol::None => {
                self.curr = (lon, lat);
                self.aligned = true;
                Ok(())
            }
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                let ra_cmd = format!(":Sr{}#", protocol::format_lx200_ra(lon));
                self.command(ra_cmd.as_bytes(), 1, None, None)?;
                let dec_cmd = format!(":Sd{}#", protocol::format_lx200_dec(lat));
                self.command(dec_cmd.as_bytes(), 1, None, None)?;
                self.command(b":CM#", 64, Some(b'#'), None)?;
                self.aligned = true;
                Ok(())
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                // Native sync needs NexStar >= 4.10 or SynScan >= 3.37.
                let version = version_number(&self.version);
                let supported = match self.protocol {
                    MountProtocol::CelestronNexStar => version >= 4.095,
                    _ => version >= 3.365,
                };
                if !supported {
                    return Err(MountError::NotSupported);
                }
                let cmd = protocol::format_nexstar_radec('s', lon, lat);
                self.command(cmd.as_bytes(), 1, Some(b'#'), None)?;
                self.aligned = true;
                Ok(())
            }
            MountProtocol::SyntaDirect | MountProtocol::CelestronAux => {
                // Encoder mounts align through the pointing model: pair the
                // current raw encoder angles with the commanded direction.
                let (x, y) = self.read_raw_encoders()?;
                self.model
                    .add_sighting(Sighting {
                        x_enc: x.as_radians(),
                        y_enc: y.as_radians(),
                        azimuth: lon.as_radians(),
                        altitude: lat.as_radians(),
                    })
                    .map_err(|_| MountError::BadAlignment)?;
                self.aligned = self.model.is_aligned();
                Ok(())
            }
        }
    }

    /// Raw encoder angles for the model-based protocols.
    fn read_raw_encoders(&mut self) -> MountResult<(Angle, Angle)> {
        match self.protocol {
            MountProtocol::SyntaDirect => {
                let x = self.synta_command('j', 1, "")?;
                let y = self.synta_command('j', 2, "")?;
                Ok((
                    protocol::synta_steps_to_angle(i64::from(x), self.counts_per_rev[0]),
                    protocol::synta_steps_to_angle(i64::from(y), self.counts_per_rev[1]),
                ))
            }
            MountProtocol::CelestronAux => {
                let azm =
                    self.aux_command(aux_command::MC_GET_POSITION, aux_device::AZM_MOTOR, &[])?;
                let alt =
                    self.aux_command(aux_command::MC_GET_POSITION, aux_device::ALT_MOTOR, &[])?;
                Ok((
                    protocol::aux_position_to_angle(&azm).ok_or(MountError::InvalidOutput)?,
                    protocol::aux_position_to_angle(&alt).ok_or(MountError::InvalidOutput)?,
                ))
            }
            _ => Err(MountError::NotSupported),
        }
    }

    fn is_slewing(&mut self) -> MountResult<bool> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::None => {
                self.sim_step();
                Ok(self.slewing)
            }
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                let reply = self.query(b":D#", 64, Some(b'#'))?;
                Ok(reply.len() > 1)
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let reply = self.query(b"L", 2, Some(b'#'))?;
                Ok(reply.first() == Some(&b'1'))
            }
            MountProtocol::CelestronAux => {
                let done = self.aux_command(
                    aux_command::MC_GOTO_DONE,
                    aux_device::AZM_MOTOR,
                    &[],
                )?;
                Ok(done.first() != Some(&0xFF))
            }
            MountProtocol::SyntaDirect => {
                // The 'f' status word is three nibbles; the middle nibble's
                // low bit is the axis-running flag.
                let status = self.synta_command('f', 1, "")?;
                Ok((status >> 4) & 0x1 != 0)
            }
        }
    }

    fn is_aligned(&mut self) -> MountResult<bool> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let reply = self.query(b"J", 2, Some(b'#'))?;
                Ok(reply.first() == Some(&1))
            }
            _ => Ok(self.aligned),
        }
    }

    fn is_tracking(&mut self) -> MountResult<bool> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let reply = self.query(b"t", 2, Some(b'#'))?;
                Ok(reply.first().copied().unwrap_or(0) != 0)
            }
            _ => Ok(self.tracking),
        }
    }

    fn set_tracking(&mut self, on: bool) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::None => {
                self.tracking = on;
                Ok(())
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let mode: u8 = if !on {
                    0
                } else if self.mount_type.is_equatorial() {
                    2
                } else {
                    1
                };
                let cmd = [b'T', mode];
                self.command(&cmd, 1, Some(b'#'), None)?;
                self.tracking = on;
                Ok(())
            }
            _ => Err(MountError::NotSupported),
        }
    }

    fn set_time(&mut self, time: Time) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        let civil = time.to_civil();
        match self.protocol {
            MountProtocol::None => Ok(()),
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                // Meade zones are hours west of UTC.
                let zone_cmd = format!(":SG{:+05.1}#", -time.zone);
                self.expect_ack(zone_cmd.as_bytes())?;
                let time_cmd = format!(
                    ":SL{:02}:{:02}:{:02.0}#",
                    civil.hour,
                    civil.min,
                    civil.sec.min(59.0).floor()
                );
                self.expect_ack(time_cmd.as_bytes())?;
                let date_cmd = format!(
                    ":SC{:02}/{:02}/{:02}#",
                    civil.month,
                    civil.day,
                    civil.year.rem_euclid(100)
                );
                // A date change triggers a slow "updating planetary data"
                // message pair on Autostars; read the ack then drain.
                self.expect_ack(date_cmd.as_bytes())?;
                Ok(())
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let zone = time.zone.round() as i8;
                let cmd = [
                    b'H',
                    civil.hour,
                    civil.min,
                    civil.sec.min(59.0) as u8,
                    civil.month,
                    civil.day,
                    (civil.year.rem_euclid(100)) as u8,
                    zone as u8,
                    0, // standard time; DST folds into the zone
                ];
                self.command(&cmd, 1, Some(b'#'), None)?;
                Ok(())
            }
            _ => Err(MountError::NotSupported),
        }
    }

    fn set_site(&mut self, site: Spherical) -> MountResult<()> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::None => Ok(()),
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                let lat = site.lat.to_dms();
                let lat_cmd = format!(":St{}{:02}*{:02}#", lat.sign, lat.deg, lat.min);
                self.expect_ack(lat_cmd.as_bytes())?;
                // Meade longitudes run west-positive 0..360.
                let lon_west = Angle::from_radians(-site.lon.as_radians()).mod_2pi();
                let lon = lon_west.to_dms();
                let lon_cmd = format!(":Sg{:03}*{:02}#", lon.deg, lon.min);
                self.expect_ack(lon_cmd.as_bytes())?;
                Ok(())
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let lat = site.lat.to_dms();
                let lon = site.lon.to_dms();
                let cmd = [
                    b'W',
                    lat.deg as u8,
                    lat.min,
                    lat.sec as u8,
                    u8::from(lat.sign == '-'),
                    lon.deg as u8,
                    lon.min,
                    lon.sec as u8,
                    u8::from(lon.sign == '-'),
                ];
                self.command(&cmd, 1, Some(b'#'), None)?;
                Ok(())
            }
            _ => Err(MountError::NotSupported),
        }
    }

    fn get_time(&mut self) -> MountResult<Time> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::None => Ok(self.coords.time()),
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                let zone = text(&self.query(b":GG#", 8, Some(b'#'))?);
                let hms = text(&self.query(b":GL#", 10, Some(b'#'))?);
                let date = text(&self.query(b":GC#", 10, Some(b'#'))?);

                let zone: f64 = zone
                    .trim_end_matches('#')
                    .trim()
                    .parse()
                    .map_err(|_| MountError::InvalidOutput)?;
                let (h, m, s) = parse_triplet(&hms, ':').ok_or(MountError::InvalidOutput)?;
                let (month, day, yy) =
                    parse_triplet(&date, '/').ok_or(MountError::InvalidOutput)?;
                Ok(Time::from_civil(
                    CalendarSystem::Gregorian,
                    -zone, // west-positive back to east-positive
                    2000 + yy as i32,
                    month as u8,
                    f64::from(day as u8),
                    h as u8,
                    m as u8,
                    s,
                ))
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let reply = self.query(b"h", 9, Some(b'#'))?;
                if reply.len() < 8 {
                    return Err(MountError::InvalidOutput);
                }
                let zone = reply[6] as i8;
                Ok(Time::from_civil(
                    CalendarSystem::Gregorian,
                    f64::from(zone) + f64::from(reply[7]),
                    2000 + i32::from(reply[5]),
                    reply[3],
                    f64::from(reply[4]),
                    reply[0],
                    reply[1],
                    f64::from(reply[2]),
                ))
            }
            _ => Err(MountError::NotSupported),
        }
    }

    fn get_site(&mut self) -> MountResult<Spherical> {
        if !self.connected {
            return Err(MountError::InvalidInput);
        }
        match self.protocol {
            MountProtocol::None => Ok(self.coords.location()),
            MountProtocol::MeadeLX200 | MountProtocol::MeadeAutostar => {
                let lon_reply = text(&self.query(b":Gg#", 10, Some(b'#'))?);
                let lat_reply = text(&self.query(b":Gt#", 10, Some(b'#'))?);
                let lon_west =
                    protocol::parse_lx200_dec(&lon_reply).ok_or(MountError::InvalidOutput)?;
                let lat =
                    protocol::parse_lx200_dec(&lat_reply).ok_or(MountError::InvalidOutput)?;
                Ok(Spherical::new(
                    Angle::from_radians(-lon_west.as_radians()).mod_pi(),
                    lat,
                    0.0,
                ))
            }
            MountProtocol::CelestronNexStar | MountProtocol::SkyWatcherSynScan => {
                let reply = self.query(b"w", 9, Some(b'#'))?;
                if reply.len() < 8 {
                    return Err(MountError::InvalidOutput);
                }
                let lat = f64::from(reply[0])
                    + f64::from(reply[1]) / 60.0
                    + f64::from(reply[2]) / 3600.0;
                let lat = if reply[3] != 0 { -lat } else { lat };
                let lon = f64::from(reply[4])
                    + f64::from(reply[5]) / 60.0
                    + f64::from(reply[6]) / 3600.0;
                let lon = if reply[7] != 0 { -lon } else { lon };
                Ok(Spherical::new(
                    Angle::from_degrees(lon),
                    Angle::from_degrees(lat),
                    0.0,
                ))
            }
            _ => Err(MountError::NotSupported),
        }
    }

    /// Sends a Meade setter and checks for the '1' acknowledgment byte.
    fn expect_ack(&mut self, cmd: &[u8]) -> MountResult<()> {
        let reply = self.command(cmd, 1, None, None)?;
        if reply.first() == Some(&b'1') {
            Ok(())
        } else {
            warn!(
                "mount rejected {:?}",
                core::str::from_utf8(cmd).unwrap_or("<binary>")
            );
            Err(MountError::InvalidOutput)
        }
    }
}

fn text(bytes: &BytesMut) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Sidereal tracking rate, radians per second.
fn sidereal_rate_rad_s() -> f64 {
    core::f64::consts::TAU / 86_164.0905
}

/// Splits `"HH:MM:SS#"`-style triplets; the third field may be fractional.
fn parse_triplet(s: &str, sep: char) -> Option<(u32, u32, f64)> {
    let s = s.trim_end_matches('#').trim();
    let mut parts = s.split(sep);
    let a: u32 = parts.next()?.trim().parse().ok()?;
    let b: u32 = parts.next()?.trim().parse().ok()?;
    let c: f64 = match parts.next() {
        Some(third) => third.trim().parse().ok()?,
        None => 0.0,
    };
    Some((a, b, c))
}

/// Leading numeric part of a firmware version string ("4.21" from
/// "4.21.5"), for the epoch and feature gates.
fn version_number(version: &str) -> f64 {
    let mut split = version.splitn(3, '.');
    let major = split.next().unwrap_or("0");
    let minor = split.next().unwrap_or("0");
    format!("{major}.{minor}").parse().unwrap_or(0.0)
}
