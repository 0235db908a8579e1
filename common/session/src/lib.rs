pub mod claims;
pub mod clock;
pub mod codec;
pub mod error;
pub mod keys;
pub mod reader;
pub mod roles;
pub mod storage;

pub use claims::{Audience, Claims, RoleClaim};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{decode, encode, try_decode};
pub use error::{StorageError, TokenError, TokenResult};
pub use keys::{AUTHENTICATED_SENTINEL, USER_DATA, USER_ROLE, USER_TOKEN};
pub use reader::{Session, SessionReader};
pub use roles::{is_shop_role, ROLE_ADMIN, ROLE_CUSTOMER, ROLE_SHOP};
pub use storage::{FileStore, MemoryStore, SessionStore};
