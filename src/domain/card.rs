use super::money::Balance;
use super::page::CardSort;
use super::ports::CardNumberCodec;
use super::user::User;
use crate::error::{BankError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of digits in a card number.
pub const CARD_NUMBER_LEN: usize = 16;

const MASK_PREFIX: &str = "**** **** **** ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

impl CardStatus {
    pub const ALL: [CardStatus; 3] = [CardStatus::Active, CardStatus::Blocked, CardStatus::Expired];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "ACTIVE",
            CardStatus::Blocked => "BLOCKED",
            CardStatus::Expired => "EXPIRED",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            CardStatus::Active => 0,
            CardStatus::Blocked => 1,
            CardStatus::Expired => 2,
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self> {
        CardStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BankError::bad_request(format!("Status {} does not exist", s.trim())))
    }
}

/// A cleartext card number: exactly 16 ASCII digits.
///
/// The digits are wiped from memory on drop and never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CardNumber(String);

impl CardNumber {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() != CARD_NUMBER_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BankError::bad_request("The card number must contain 16 digits"));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        mask(&self.0).into_owned()
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber({})", self.masked())
    }
}

/// Hides all but the last four digits of a card number.
///
/// Values shorter than a full card number are returned unmodified.
pub fn mask(number: &str) -> Cow<'_, str> {
    let len = number.chars().count();
    if len < CARD_NUMBER_LEN {
        return Cow::Borrowed(number);
    }
    let last_four: String = number.chars().skip(len - 4).collect();
    Cow::Owned(format!("{MASK_PREFIX}{last_four}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    pub number: CardNumber,
    pub owner: User,
    pub expiration: NaiveDate,
    pub balance: Balance,
    pub status: CardStatus,
}

impl Card {
    pub fn is_owned_by(&self, user: &User) -> bool {
        self.owner == *user
    }
}

/// A card that has passed creation checks but has no identifier yet.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub number: CardNumber,
    pub owner: User,
    pub expiration: NaiveDate,
    pub balance: Balance,
}

impl NewCard {
    pub fn into_card(self, id: CardId) -> Card {
        Card {
            id,
            number: self.number,
            owner: self.owner,
            expiration: self.expiration,
            balance: self.balance,
            status: CardStatus::Active,
        }
    }
}

/// The at-rest form of a card: the number only exists as a sealed token plus
/// a lookup digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    pub number_token: String,
    pub number_digest: String,
    pub owner: User,
    pub expiration: NaiveDate,
    pub balance: Balance,
    pub status: CardStatus,
}

impl CardRecord {
    pub fn seal(card: &Card, codec: &dyn CardNumberCodec) -> Result<Self> {
        Ok(Self {
            id: card.id,
            number_token: codec.encode(card.number.as_str())?,
            number_digest: codec.digest(card.number.as_str()),
            owner: card.owner.clone(),
            expiration: card.expiration,
            balance: card.balance,
            status: card.status,
        })
    }

    pub fn open(&self, codec: &dyn CardNumberCodec) -> Result<Card> {
        let plain = codec.decode(&self.number_token)?;
        let number = CardNumber::parse(&plain)
            .map_err(|_| BankError::Encryption("Decryption failed".to_string()))?;
        Ok(Card {
            id: self.id,
            number,
            owner: self.owner.clone(),
            expiration: self.expiration,
            balance: self.balance,
            status: self.status,
        })
    }
}

impl CardSort {
    /// Orders stored cards by this field, breaking ties by id.
    pub fn compare(&self, a: &CardRecord, b: &CardRecord) -> Ordering {
        let primary = match self {
            CardSort::Balance => a.balance.cmp(&b.balance),
            CardSort::Expiration => a.expiration.cmp(&b.expiration),
            CardSort::Id => Ordering::Equal,
        };
        primary.then(a.id.cmp(&b.id))
    }
}

/// Outward-facing card summary. The number is always masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub masked_number: String,
    pub owner: String,
    pub expiration: NaiveDate,
    pub balance: Balance,
    pub status: CardStatus,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            masked_number: card.number.masked(),
            owner: card.owner.username.clone(),
            expiration: card.expiration,
            balance: card.balance,
            status: card.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_full_number() {
        assert_eq!(mask("1234567812345678"), "**** **** **** 5678");
    }

    #[test]
    fn test_mask_longer_value_keeps_last_four() {
        assert_eq!(mask("12345678123456789012"), "**** **** **** 9012");
    }

    #[test]
    fn test_mask_short_value_unmodified() {
        assert_eq!(mask("123456781234567"), "123456781234567");
        assert_eq!(mask(""), "");
        let missing: Option<&str> = None;
        assert_eq!(missing.map(mask), None);
    }

    #[test]
    fn test_card_number_parse() {
        assert!(CardNumber::parse("1234567812345678").is_ok());
        assert!(CardNumber::parse("123456781234567").is_err());
        assert!(CardNumber::parse("12345678123456789").is_err());
        assert!(CardNumber::parse("1234 5678 1234 5").is_err());
        assert!(CardNumber::parse("１234567812345678").is_err());
    }

    #[test]
    fn test_card_number_debug_is_masked() {
        let number = CardNumber::parse("1234567812345678").unwrap();
        let debug = format!("{:?}", number);
        assert!(!debug.contains("12345678"));
        assert!(debug.contains("5678"));
    }

    #[test]
    fn test_card_status_parse() {
        assert_eq!("blocked".parse::<CardStatus>().unwrap(), CardStatus::Blocked);
        assert_eq!("ACTIVE".parse::<CardStatus>().unwrap(), CardStatus::Active);
        assert!(matches!(
            "FROZEN".parse::<CardStatus>(),
            Err(BankError::BadRequest(_))
        ));
    }
}
