pub mod multipart;
pub mod password;
pub mod validation;

pub use multipart::{FormFile, MultipartForm};
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::ValidatedJson;
