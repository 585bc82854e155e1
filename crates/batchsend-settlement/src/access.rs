//! Single-owner access control for privileged engine operations.

use batchsend_types::{Address, BatchSendError, Result};

/// Authorization capability held by the engine.
pub trait AccessControl {
    /// Whether `identity` may run privileged operations.
    fn is_owner(&self, identity: &Address) -> bool;
}

/// One owner, assigned at construction and handed over explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    /// # Errors
    /// Returns [`BatchSendError::InvalidOwner`] for the zero address.
    pub fn new(owner: Address) -> Result<Self> {
        if owner.is_zero() {
            return Err(BatchSendError::InvalidOwner);
        }
        Ok(Self { owner })
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Hand ownership to `new_owner`. Only the current owner may do this.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `InvalidOwner` if `new_owner` is the zero address
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        if !self.is_owner(caller) {
            return Err(BatchSendError::Unauthorized { caller: *caller });
        }
        if new_owner.is_zero() {
            return Err(BatchSendError::InvalidOwner);
        }
        tracing::info!(from = %self.owner, to = %new_owner, "Ownership transferred");
        self.owner = new_owner;
        Ok(())
    }
}

impl AccessControl for Ownable {
    fn is_owner(&self, identity: &Address) -> bool {
        self.owner == *identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_recognized() {
        let owner = Address::random();
        let acl = Ownable::new(owner).unwrap();
        assert!(acl.is_owner(&owner));
        assert!(!acl.is_owner(&Address::random()));
        assert_eq!(acl.owner(), owner);
    }

    #[test]
    fn zero_owner_rejected() {
        assert_eq!(
            Ownable::new(Address::ZERO).unwrap_err(),
            BatchSendError::InvalidOwner
        );
    }

    #[test]
    fn transfer_ownership_by_owner() {
        let (owner, next) = (Address::random(), Address::random());
        let mut acl = Ownable::new(owner).unwrap();
        acl.transfer_ownership(&owner, next).unwrap();
        assert!(acl.is_owner(&next));
        assert!(!acl.is_owner(&owner));
    }

    #[test]
    fn transfer_ownership_by_stranger_fails() {
        let (owner, stranger) = (Address::random(), Address::random());
        let mut acl = Ownable::new(owner).unwrap();
        let err = acl.transfer_ownership(&stranger, stranger).unwrap_err();
        assert_eq!(err, BatchSendError::Unauthorized { caller: stranger });
        assert!(acl.is_owner(&owner));
    }

    #[test]
    fn transfer_ownership_to_zero_fails() {
        let owner = Address::random();
        let mut acl = Ownable::new(owner).unwrap();
        let err = acl.transfer_ownership(&owner, Address::ZERO).unwrap_err();
        assert_eq!(err, BatchSendError::InvalidOwner);
        assert!(acl.is_owner(&owner));
    }
}
