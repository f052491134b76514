use agent_kms::KmsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcHolderError {
    #[error(transparent)]
    Kms(#[from] KmsError),
    #[error("Credential record has no record id")]
    MissingRecordId,
    #[error("Credential search is closed")]
    SearchClosed,
}
