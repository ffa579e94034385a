//! Parking lots and their spot pools.

use std::fmt;

use crate::domain::{Address, LocationValidationError, Pincode, UserId};

use super::{Money, MoneyError, ParkingSpot, SpotNumber};

/// Maximum length of a lot name.
pub const LOT_NAME_MAX: usize = 100;
/// Largest pool a lot may be created with.
pub const SPOT_COUNT_MAX: u32 = 1000;

uuid_identifier!(
    /// Stable identifier of a parking lot.
    LotId,
    "lot"
);

/// Validation errors for lot fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LotValidationError {
    /// Blank lot name.
    #[error("lot name must not be empty")]
    EmptyName,
    /// Lot name longer than [`LOT_NAME_MAX`].
    #[error("lot name must be at most {max} characters")]
    NameTooLong { max: usize },
    /// Spot count outside `1..=SPOT_COUNT_MAX`.
    #[error("spot count must be between 1 and {max}")]
    SpotCountOutOfRange { max: u32 },
    /// Address or pincode problem.
    #[error(transparent)]
    Location(#[from] LocationValidationError),
    /// Price problem.
    #[error("price per hour: {0}")]
    Price(#[from] MoneyError),
}

impl LotValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName | Self::NameTooLong { .. } => "name",
            Self::SpotCountOutOfRange { .. } => "max_spots",
            Self::Location(LocationValidationError::InvalidPincode) => "pincode",
            Self::Location(_) => "address",
            Self::Price(_) => "price_per_hour",
        }
    }
}

/// Display name of a lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotName(String);

impl LotName {
    /// Validate and construct a lot name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LotValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LotValidationError::EmptyName);
        }
        if trimmed.chars().count() > LOT_NAME_MAX {
            return Err(LotValidationError::NameTooLong { max: LOT_NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for LotName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Initial number of spots allocated when a lot is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpotCount(u32);

impl SpotCount {
    /// Validate a spot count against `1..=SPOT_COUNT_MAX`.
    pub fn new(raw: i64) -> Result<Self, LotValidationError> {
        match u32::try_from(raw) {
            Ok(value) if (1..=SPOT_COUNT_MAX).contains(&value) => Ok(Self(value)),
            _ => Err(LotValidationError::SpotCountOutOfRange {
                max: SPOT_COUNT_MAX,
            }),
        }
    }

    /// Spot numbers `1..=N` in ascending order.
    pub fn numbers(self) -> impl Iterator<Item = SpotNumber> {
        // Bounded by SPOT_COUNT_MAX, so every value is a valid spot number.
        (1..=i64::from(self.0)).filter_map(|n| SpotNumber::new(n).ok())
    }

    /// Numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

/// A parking lot owned by the admin who created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingLot {
    pub id: LotId,
    pub owner: UserId,
    pub name: LotName,
    pub address: Address,
    pub pincode: Pincode,
    pub price_per_hour: Money,
}

/// Validated request to create a lot with `spot_count` spots.
#[derive(Debug, Clone)]
pub struct LotDraft {
    pub name: LotName,
    pub address: Address,
    pub pincode: Pincode,
    pub price_per_hour: Money,
    pub spot_count: SpotCount,
}

impl LotDraft {
    /// Materialise the lot and its initial pool of vacant spots `1..=N`.
    pub fn into_lot_with_spots(self, owner: UserId) -> LotWithSpots {
        let lot = ParkingLot {
            id: LotId::random(),
            owner,
            name: self.name,
            address: self.address,
            pincode: self.pincode,
            price_per_hour: self.price_per_hour,
        };
        let spots = self
            .spot_count
            .numbers()
            .map(|number| ParkingSpot::vacant(lot.id, number))
            .collect();
        LotWithSpots { lot, spots }
    }
}

/// Partial metadata update. Resizing is not supported; spots are managed
/// individually.
#[derive(Debug, Clone, Default)]
pub struct LotChanges {
    pub name: Option<LotName>,
    pub address: Option<Address>,
    pub pincode: Option<Pincode>,
    pub price_per_hour: Option<Money>,
}

impl LotChanges {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.pincode.is_none()
            && self.price_per_hour.is_none()
    }

    /// Apply the changes to `lot`, keeping unspecified fields.
    pub fn apply_to(self, lot: ParkingLot) -> ParkingLot {
        ParkingLot {
            name: self.name.unwrap_or(lot.name),
            address: self.address.unwrap_or(lot.address),
            pincode: self.pincode.unwrap_or(lot.pincode),
            price_per_hour: self.price_per_hour.unwrap_or(lot.price_per_hour),
            ..lot
        }
    }
}

/// A lot together with its spots, ordered by spot number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotWithSpots {
    pub lot: ParkingLot,
    pub spots: Vec<ParkingSpot>,
}

impl LotWithSpots {
    /// Number of spots in the lot.
    pub fn total_spots(&self) -> usize {
        self.spots.len()
    }

    /// Number of spots free to claim.
    pub fn available_spots(&self) -> usize {
        self.spots.iter().filter(|spot| !spot.occupied).count()
    }

    /// Number of spots held or in use.
    pub fn occupied_spots(&self) -> usize {
        self.total_spots() - self.available_spots()
    }

    /// Whether any spot is occupied, which blocks deletion.
    pub fn has_occupied_spot(&self) -> bool {
        self.spots.iter().any(|spot| spot.occupied)
    }
}
