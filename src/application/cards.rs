use super::balance::OpeningBalance;
use super::locks::CardLocks;
use super::users::UserDirectory;
use crate::domain::card::{CardId, CardNumber, CardStatus, CardView, NewCard, mask};
use crate::domain::lifecycle::check_transition;
use crate::domain::page::{CardSort, PageRequest};
use crate::domain::ports::{SharedCardStore, SharedClock};
use crate::domain::user::Principal;
use crate::error::{BankError, ErrorKind, Result};
use chrono::NaiveDate;

/// Input for issuing a card.
#[derive(Debug, Clone)]
pub struct CardRequest {
    pub number: String,
    pub expiration: NaiveDate,
}

/// Card issuing, deletion, listing and moderation.
///
/// Moderation is the only path that changes a card's status; every move is
/// checked against the lifecycle table while the card's lock is held.
#[derive(Clone)]
pub struct CardService {
    cards: SharedCardStore,
    users: UserDirectory,
    locks: CardLocks,
    clock: SharedClock,
    opening_balance: OpeningBalance,
}

impl CardService {
    pub fn new(
        cards: SharedCardStore,
        users: UserDirectory,
        locks: CardLocks,
        clock: SharedClock,
        opening_balance: OpeningBalance,
    ) -> Self {
        Self {
            cards,
            users,
            locks,
            clock,
            opening_balance,
        }
    }

    /// Issues a new ACTIVE card to the principal.
    pub async fn create(&self, principal: &Principal, request: CardRequest) -> Result<CardView> {
        tracing::info!(owner = %principal, number = %mask(&request.number), "Creating card");
        let number = CardNumber::parse(&request.number)?;
        if request.expiration <= self.clock.today() {
            return Err(BankError::bad_request("The expiration date must be in the future"));
        }
        let owner = self.users.resolve(principal).await?;
        let balance = self.opening_balance.draw()?;

        let new_card = NewCard {
            number,
            owner,
            expiration: request.expiration,
            balance,
        };
        let card = self.cards.create(new_card).await.map_err(|e| match e.kind() {
            ErrorKind::BadRequest => e,
            _ => {
                tracing::error!(error = %e, "Card creation failed");
                BankError::Creation(format!("Failed to create card: {}", e))
            }
        })?;

        tracing::info!(card_id = %card.id, owner = %card.owner.username, "Card created");
        Ok(CardView::from(&card))
    }

    /// Deletes one of the principal's own cards.
    pub async fn delete_own(&self, principal: &Principal, id: CardId) -> Result<()> {
        let user = self.users.resolve(principal).await?;
        let _guard = self.locks.lock(id).await;
        let card = self.cards.find_by_id(id).await?.ok_or_else(|| card_not_found(id))?;
        if !card.is_owned_by(&user) {
            tracing::warn!(card_id = %id, user_id = %user.id, "Delete rejected: not the owner");
            return Err(BankError::bad_request(format!(
                "The user id={} is not the owner of the card with id={}.",
                user.id, id
            )));
        }
        self.cards.delete_by_id(id).await?;
        tracing::info!(card_id = %id, "Card deleted by owner");
        Ok(())
    }

    /// Deletes any card.
    pub async fn delete(&self, id: CardId) -> Result<()> {
        let _guard = self.locks.lock(id).await;
        if !self.cards.exists_by_id(id).await? {
            return Err(card_not_found(id));
        }
        self.cards.delete_by_id(id).await?;
        tracing::info!(card_id = %id, "Card deleted");
        Ok(())
    }

    pub async fn list_own(
        &self,
        principal: &Principal,
        page: &PageRequest<CardSort>,
    ) -> Result<Vec<CardView>> {
        let user = self.users.resolve(principal).await?;
        let cards = self.cards.find_by_owner(user.id, page).await?;
        Ok(cards.iter().map(CardView::from).collect())
    }

    /// Lists cards, optionally narrowed to one status and/or one holder.
    pub async fn list(
        &self,
        status: Option<CardStatus>,
        username: Option<&str>,
        page: &PageRequest<CardSort>,
    ) -> Result<Vec<CardView>> {
        let owner = match username {
            Some(name) => Some(self.users.find(name).await?.id),
            None => None,
        };
        let cards = match (status, owner) {
            (None, None) => self.cards.find_all(page).await?,
            (Some(status), None) => self.cards.find_by_status(status, page).await?,
            (None, Some(owner)) => self.cards.find_by_owner(owner, page).await?,
            (Some(status), Some(owner)) => {
                self.cards.find_by_status_and_owner(status, owner, page).await?
            }
        };
        tracing::debug!(count = cards.len(), "Cards listed");
        Ok(cards.iter().map(CardView::from).collect())
    }

    /// Moves the card with the given cleartext number to `target`.
    pub async fn moderate(&self, number: &str, target: CardStatus) -> Result<()> {
        tracing::info!(number = %mask(number), %target, "Moderating card");
        let id = self
            .cards
            .find_by_number(number)
            .await?
            .ok_or_else(|| {
                tracing::error!(number = %mask(number), "Card not found");
                BankError::not_found(format!("Card {} not found", mask(number)))
            })?
            .id;

        let _guard = self.locks.lock(id).await;
        // Re-read under the lock; the card may have changed while we waited.
        let mut card = self.cards.find_by_id(id).await?.ok_or_else(|| card_not_found(id))?;
        check_transition(card.status, target).map_err(|e| {
            tracing::warn!(card_id = %id, from = %card.status, %target, "Moderation rejected: {}", e);
            e.into_bank_error(id)
        })?;

        card.status = target;
        self.cards.save(&card).await?;
        tracing::info!(card_id = %id, status = %target, "Card status changed");
        Ok(())
    }
}

fn card_not_found(id: CardId) -> BankError {
    tracing::error!(card_id = %id, "Card not found");
    BankError::not_found(format!("Card with id={} not found", id))
}
