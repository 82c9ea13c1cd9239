//! Projects the decompressed memory image onto typed player and object
//! records. Everything here is a fixed-offset read against the layout
//! the game used in memory; nothing is searched for or inferred.

use byteorder::{BigEndian, ByteOrder};
use log::warn;

use crate::error::StateError;

/// Number of object slots in the table.
pub const SLOT_COUNT: usize = 0x73;
/// Distance between consecutive slots.
pub const SLOT_STRIDE: usize = 0x11e;
/// Offset of slot 0 inside the memory image.
pub const SLOT_BASE: usize = 0x72;

/// Legacy memory addresses of player globals are shifted by this
/// platform delta to obtain image offsets.
const PLATFORM_DELTA: usize = 0x506;

// Slot-relative field offsets.
const OFF_TYPE: usize = 0x00;
const OFF_SPEED: usize = 0x12;
const OFF_COUNTER_A: usize = 0x1a;
const OFF_COUNTER_B: usize = 0x1e;
const OFF_BOUNTY: usize = 0x32;
const OFF_NAME: usize = 0x3a;
const NAME_LEN: usize = 20;
const OFF_SHOOTING: usize = 0x5e;
const SHOOTING_ACTIVE: u8 = 0x0a;
const OFF_RELATIVE: usize = 0xa6;
const OFF_ACCEL_FORWARD: usize = 0xfc;
const OFF_ACCEL_REVERSE: usize = 0xfe;
// The three equipment masks are not laid out in display order.
const OFF_EQUIPMENT_A: usize = 0x100;
const OFF_EQUIPMENT_B: usize = 0x103;
const OFF_EQUIPMENT_C: usize = 0x102;
const OFF_DRIVE: usize = 0x108;
const OFF_GUN_COUNT: usize = 0x109;
const OFF_GUNS: usize = 0x10a;
const MAX_GUNS: usize = SLOT_STRIDE - OFF_GUNS;

// Player globals, as legacy addresses (the platform delta applies).
// These sit in the verbatim zone of the image.
const ADDR_OWN_SHIP: usize = 0x8601;
const ADDR_MONEY: usize = 0x8660;
const ADDR_CARGO: usize = 0x866e;
const ADDR_FUEL: usize = 0x8670;
const ADDR_DAY: usize = 0x8674;
const ADDR_FEDERAL: usize = 0x867c;
const ADDR_IMPERIAL: usize = 0x867e;
const ADDR_KILLS: usize = 0x8680;

/// Image length needed before any field can be read safely.
pub const MIN_IMAGE_LEN: usize = ADDR_KILLS - PLATFORM_DELTA + 2;

/// The game calendar starts here; years are 365.25 days and months one
/// twelfth of that.
pub const EPOCH_YEAR: i32 = 3200;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Slot index of the ship the player is flying.
    pub own_ship: u8,
    /// Money in tenths of a credit.
    pub money: i32,
    pub cargo: u16,
    pub fuel: u16,
    /// Day counter since the game epoch.
    pub days: i32,
    pub federal_points: u16,
    pub imperial_points: u16,
    pub kills: u16,
}

impl PlayerRecord {
    pub fn date(&self) -> GameDate {
        GameDate::from_days(self.days)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GameDate {
    pub day: u8,
    pub month: u8,
    pub year: i32,
}

impl GameDate {
    pub fn from_days(days: i32) -> Self {
        let total = f64::from(days.max(0));
        let years = (total / DAYS_PER_YEAR).floor();
        let of_year = total - years * DAYS_PER_YEAR;
        let month = (of_year / (DAYS_PER_YEAR / 12.0)).floor().min(11.0);
        let day = of_year - month * (DAYS_PER_YEAR / 12.0);

        GameDate {
            day: day as u8 + 1,
            month: month as u8 + 1,
            year: EPOCH_YEAR + years as i32,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameObjectRecord {
    /// Position of this record in the slot table.
    pub slot: usize,
    pub type_id: u8,
    pub name: Option<String>,
    /// Speed in tenths of a unit.
    pub speed: u16,
    pub counter_a: u16,
    pub counter_b: u16,
    pub bounty: u16,
    pub shooting_started: bool,
    /// Back-reference into the same slot table, resolved only for
    /// display. Never an owning pointer.
    pub relative: u8,
    pub accel_forward: u16,
    pub accel_reverse: u16,
    /// The three equipment masks, in display order A, B, C.
    pub equipment: [u8; 3],
    pub drive: u8,
    /// Gun position byte per mounted gun.
    pub guns: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub player: PlayerRecord,
    /// Slot arena; `None` marks an empty slot (type id 0).
    pub objects: Vec<Option<GameObjectRecord>>,
}

impl GameState {
    /// Resolve a record's `relative` back-reference. An out-of-range or
    /// empty target is an anomaly in the file, reported and tolerated.
    pub fn relative_of(&self, record: &GameObjectRecord) -> Option<&GameObjectRecord> {
        let index = usize::from(record.relative);
        match self.objects.get(index) {
            Some(Some(target)) => Some(target),
            _ => {
                warn!(
                    "slot {} references missing or empty slot {index}",
                    record.slot
                );
                None
            }
        }
    }

    pub fn own_ship(&self) -> Option<&GameObjectRecord> {
        self.objects
            .get(usize::from(self.player.own_ship))
            .and_then(Option::as_ref)
    }
}

/// Decode the memory image into the player record and the object table.
pub fn decode(image: &[u8]) -> Result<GameState, StateError> {
    if image.len() < MIN_IMAGE_LEN {
        return Err(StateError::TruncatedImage {
            expected: MIN_IMAGE_LEN,
            received: image.len(),
        });
    }

    let player = decode_player(image);

    let mut objects = Vec::with_capacity(SLOT_COUNT);
    for slot in 0..SLOT_COUNT {
        let base = SLOT_BASE + slot * SLOT_STRIDE;
        objects.push(decode_slot(slot, &image[base..base + SLOT_STRIDE]));
    }

    Ok(GameState { player, objects })
}

fn global(image: &[u8], addr: usize) -> &[u8] {
    &image[addr - PLATFORM_DELTA..]
}

fn decode_player(image: &[u8]) -> PlayerRecord {
    PlayerRecord {
        own_ship: global(image, ADDR_OWN_SHIP)[0],
        money: BigEndian::read_i32(global(image, ADDR_MONEY)),
        cargo: BigEndian::read_u16(global(image, ADDR_CARGO)),
        fuel: BigEndian::read_u16(global(image, ADDR_FUEL)),
        days: BigEndian::read_i32(global(image, ADDR_DAY)),
        federal_points: BigEndian::read_u16(global(image, ADDR_FEDERAL)),
        imperial_points: BigEndian::read_u16(global(image, ADDR_IMPERIAL)),
        kills: BigEndian::read_u16(global(image, ADDR_KILLS)),
    }
}

fn decode_slot(slot: usize, bytes: &[u8]) -> Option<GameObjectRecord> {
    let type_id = bytes[OFF_TYPE];
    if type_id == 0 {
        return None;
    }

    let name_field = &bytes[OFF_NAME..OFF_NAME + NAME_LEN];
    let name_len = name_field
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(NAME_LEN);
    let name = if name_len == 0 {
        None
    } else {
        Some(String::from_utf8_lossy(&name_field[..name_len]).into_owned())
    };

    let declared_guns = usize::from(bytes[OFF_GUN_COUNT]);
    let gun_count = if declared_guns > MAX_GUNS {
        warn!("slot {slot} declares {declared_guns} gun mounts, reading the {MAX_GUNS} that fit");
        MAX_GUNS
    } else {
        declared_guns
    };
    let guns = bytes[OFF_GUNS..OFF_GUNS + gun_count].to_vec();

    Some(GameObjectRecord {
        slot,
        type_id,
        name,
        speed: BigEndian::read_u16(&bytes[OFF_SPEED..]),
        counter_a: BigEndian::read_u16(&bytes[OFF_COUNTER_A..]),
        counter_b: BigEndian::read_u16(&bytes[OFF_COUNTER_B..]),
        bounty: BigEndian::read_u16(&bytes[OFF_BOUNTY..]),
        shooting_started: bytes[OFF_SHOOTING] == SHOOTING_ACTIVE,
        relative: bytes[OFF_RELATIVE],
        accel_forward: BigEndian::read_u16(&bytes[OFF_ACCEL_FORWARD..]),
        accel_reverse: BigEndian::read_u16(&bytes[OFF_ACCEL_REVERSE..]),
        equipment: [
            bytes[OFF_EQUIPMENT_A],
            bytes[OFF_EQUIPMENT_B],
            bytes[OFF_EQUIPMENT_C],
        ],
        drive: bytes[OFF_DRIVE],
        guns,
    })
}
