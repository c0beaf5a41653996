use crate::application::{Bank, CardRequest};
use crate::domain::card::{CardId, CardStatus};
use crate::domain::money::Amount;
use crate::domain::transaction::{TransactionId, TransactionStatus};
use crate::domain::user::{Principal, PrincipalProvider};
use crate::error::{BankError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandOp {
    Register,
    Create,
    Transfer,
    Moderate,
    SetStatus,
    Delete,
    DeleteOwn,
}

/// One raw CSV row. Which columns are required depends on `op`.
///
/// Amounts stay text until they reach `Amount::from_str`, so no float
/// conversion ever happens.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRecord {
    pub op: CommandOp,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub card: Option<u64>,
    #[serde(default)]
    pub target: Option<u64>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expires: Option<NaiveDate>,
    #[serde(default)]
    pub tx: Option<u64>,
}

impl PrincipalProvider for CommandRecord {
    fn principal(&self) -> Result<Principal> {
        Principal::new(self.principal.clone().unwrap_or_default())
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_else(|| BankError::bad_request(format!("Missing column '{}'", column)))
}

/// A validated command, ready to run against a `Bank`.
#[derive(Debug, Clone)]
pub enum Command {
    Register {
        username: String,
    },
    Create {
        principal: Principal,
        request: CardRequest,
    },
    Transfer {
        principal: Principal,
        source: CardId,
        target: CardId,
        amount: Amount,
    },
    Moderate {
        number: String,
        status: CardStatus,
    },
    SetStatus {
        tx: TransactionId,
        status: TransactionStatus,
    },
    Delete {
        card: CardId,
    },
    DeleteOwn {
        principal: Principal,
        card: CardId,
    },
}

impl TryFrom<CommandRecord> for Command {
    type Error = BankError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let command = match record.op {
            CommandOp::Register => Command::Register {
                username: record.principal()?.name().to_string(),
            },
            CommandOp::Create => Command::Create {
                principal: record.principal()?,
                request: CardRequest {
                    number: required(record.number, "number")?,
                    expiration: required(record.expires, "expires")?,
                },
            },
            CommandOp::Transfer => Command::Transfer {
                principal: record.principal()?,
                source: CardId(required(record.card, "card")?),
                target: CardId(required(record.target, "target")?),
                amount: required(record.amount.as_deref(), "amount")?.parse()?,
            },
            CommandOp::Moderate => Command::Moderate {
                number: required(record.number, "number")?,
                status: required(record.status.as_deref(), "status")?.parse()?,
            },
            CommandOp::SetStatus => Command::SetStatus {
                tx: TransactionId(required(record.tx, "tx")?),
                status: required(record.status.as_deref(), "status")?.parse()?,
            },
            CommandOp::Delete => Command::Delete {
                card: CardId(required(record.card, "card")?),
            },
            CommandOp::DeleteOwn => Command::DeleteOwn {
                principal: record.principal()?,
                card: CardId(required(record.card, "card")?),
            },
        };
        Ok(command)
    }
}

impl Command {
    pub async fn execute(self, bank: &Bank) -> Result<()> {
        match self {
            Command::Register { username } => {
                bank.users.register(&username).await?;
            }
            Command::Create { principal, request } => {
                bank.cards.create(&principal, request).await?;
            }
            Command::Transfer {
                principal,
                source,
                target,
                amount,
            } => {
                bank.transfers
                    .transfer(&principal, source, target, amount)
                    .await?;
            }
            Command::Moderate { number, status } => {
                bank.cards.moderate(&number, status).await?;
            }
            Command::SetStatus { tx, status } => {
                bank.ledger.set_status(tx, status).await?;
            }
            Command::Delete { card } => bank.cards.delete(card).await?,
            Command::DeleteOwn { principal, card } => {
                bank.cards.delete_own(&principal, card).await?
            }
        }
        Ok(())
    }
}

/// Reads commands from a CSV source.
///
/// Whitespace is trimmed and rows may omit trailing columns.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a reader over a headed commands CSV.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily parses each row into a `Command`.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<CommandRecord>()
            .map(|row| row.map_err(BankError::from).and_then(Command::try_from))
    }
}
