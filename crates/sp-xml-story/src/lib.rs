//! A small XML story engine implementing the `sp_runtime::Story` contract.
//!
//! ```xml
//! <story>
//!   <var name="bg" value='"a"'/>
//!   <text>Morning, ${bg}.</text>
//!   <choice>
//!     <option text="Go out">
//!       <set var="bg" value='"b"'/>
//!     </option>
//!   </choice>
//!   <include path="chapter2.xml"/>
//! </story>
//! ```
//!
//! One `continue_step` runs `<set>` nodes up to and including the next
//! `<text>`. Choosing an option leaves the debug location on its `<option>`
//! element.

mod compile;
mod runtime;
mod value;

pub use compile::XmlStoryCompiler;
pub use runtime::XmlStory;
pub use value::XmlValue;
