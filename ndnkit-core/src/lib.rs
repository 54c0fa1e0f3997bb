//! The core of an NDN endpoint: the packet-object model (Name, Interest,
//! Data, KeyLocator, Signature, ForwardingEntry) and bit-exact codecs for
//! the two NDN wire formats, NDN-TLV and the legacy Binary XML (ccnb).
//!
//! Both codecs expose the signed-portion byte offsets of Data packets and
//! signed interests, so a security layer can hash exactly the bytes a
//! signature covers. Packet objects report mutation through change counts,
//! letting callers invalidate derived state such as cached encodings.
//!
//! Encoding goes through a process-wide default [`WireFormat`] unless a
//! call names one explicitly:
//!
//! ```
//! use ndnkit_core::{Interest, Name};
//!
//! let mut interest = Interest::new(Name::from_uri("ndn:/example/data"));
//! interest.set_interest_lifetime_ms(4000.0);
//! let encoding = interest.wire_encode().unwrap();
//! assert_eq!(encoding.blob().bytes()[0], 5);
//! ```

pub mod binary_xml;
pub mod blob;
pub mod change_counter;
pub mod data;
pub mod error;
pub mod exclude;
pub mod forwarding_entry;
pub mod interest;
pub mod key_locator;
pub mod meta_info;
pub mod name;
pub mod signature;
pub mod tlv;
pub mod tpm;
pub mod wire_format;

pub use blob::{Blob, SignedBlob};
pub use change_counter::{ChangeCounter, Changed};
pub use data::Data;
pub use error::CodecError;
pub use exclude::{Exclude, ExcludeEntry};
pub use forwarding_entry::{ForwardingEntry, ForwardingFlags};
pub use interest::Interest;
pub use key_locator::{KeyLocator, KeyLocatorType, KeyNameType, PublisherPublicKeyDigest};
pub use meta_info::{ContentType, MetaInfo};
pub use name::{ComponentType, Name, NameComponent};
pub use signature::{Signature, SignatureType};
pub use tpm::{KeyParams, TpmBackEnd, TpmBackEndMemory, TpmError, TpmKeyHandle};
pub use wire_format::{
    default_wire_format, set_default_wire_format, BinaryXmlWireFormat, TlvWireFormat, WireFormat,
};
