// SPECLINK: https://www.w3.org/TR/DOM-Level-2-Core/core.html#ID-17189187
// SPECLINK: https://www.w3.org/TR/DOM-Level-2-Traversal-Range/ranges.html#Level-2-Range-Exceptions
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, thiserror::Error)]
#[error("{name:?} ({code}): {message}")]
pub struct DomException {
    pub name: ErrorName,
    pub message: &'static str,
    pub code: u16,
}

impl DomException {
    fn new(name: ErrorName, message: &'static str, code: u16) -> Self {
        Self {
            name,
            message,
            code,
        }
    }

    /// Whether this error belongs to the `RangeException` family rather than `DOMException`.
    pub fn is_range_exception(&self) -> bool {
        matches!(
            self.name,
            ErrorName::BadBoundaryPointsError | ErrorName::InvalidNodeTypeError
        )
    }
}

impl From<ErrorName> for DomException {
    fn from(value: ErrorName) -> Self {
        match value {
            ErrorName::IndexSizeError => DomException::new(
                value,
                "The index is not in the allowed range.",
                DomException::INDEX_SIZE_ERR,
            ),
            ErrorName::HierarchyRequestError => DomException::new(
                value,
                "The operation would yield an incorrect node tree.",
                DomException::HIERARCHY_REQUEST_ERR,
            ),
            ErrorName::WrongDocumentError => DomException::new(
                value,
                "The object is in the wrong document.",
                DomException::WRONG_DOCUMENT_ERR,
            ),
            ErrorName::NoModificationAllowedError => DomException::new(
                value,
                "The object can not be modified.",
                DomException::NO_MODIFICATION_ALLOWED_ERR,
            ),
            ErrorName::NotFoundError => DomException::new(
                value,
                "The object can not be found here.",
                DomException::NOT_FOUND_ERR,
            ),
            ErrorName::NotSupportedError => DomException::new(
                value,
                "The operation is not supported.",
                DomException::NOT_SUPPORTED_ERR,
            ),
            ErrorName::InvalidStateError => DomException::new(
                value,
                "The object is in an invalid state.",
                DomException::INVALID_STATE_ERR,
            ),
            ErrorName::SyntaxError => DomException::new(
                value,
                "The string did not match the expected pattern.",
                DomException::SYNTAX_ERR,
            ),
            ErrorName::BadBoundaryPointsError => DomException::new(
                value,
                "The boundary-points of the range do not meet the requirements.",
                DomException::BAD_BOUNDARYPOINTS_ERR,
            ),
            ErrorName::InvalidNodeTypeError => DomException::new(
                value,
                "The container of a boundary-point is of an invalid type.",
                DomException::INVALID_NODE_TYPE_ERR,
            ),
        }
    }
}

impl DomException {
    pub const INDEX_SIZE_ERR: u16 = 1;
    pub const HIERARCHY_REQUEST_ERR: u16 = 3;
    pub const WRONG_DOCUMENT_ERR: u16 = 4;
    pub const NO_MODIFICATION_ALLOWED_ERR: u16 = 7;
    pub const NOT_FOUND_ERR: u16 = 8;
    pub const NOT_SUPPORTED_ERR: u16 = 9;
    pub const INVALID_STATE_ERR: u16 = 11;
    pub const SYNTAX_ERR: u16 = 12;

    // RangeException codes.
    pub const BAD_BOUNDARYPOINTS_ERR: u16 = 1;
    pub const INVALID_NODE_TYPE_ERR: u16 = 2;
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum ErrorName {
    IndexSizeError,
    HierarchyRequestError,
    WrongDocumentError,
    NoModificationAllowedError,
    NotFoundError,
    NotSupportedError,
    InvalidStateError,
    SyntaxError,
    BadBoundaryPointsError,
    InvalidNodeTypeError,
}
