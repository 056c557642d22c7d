/*!
Observable values for warroom screens.

A screen owns a [`Mut`] holding its current list; views get a [`Read`] and either
subscribe to it or await a particular state with [`Wait::wait_for`]. Failure
notices travel over a plain [`Broadcast`].

```rust
use warroom_signals::*;

let roster = Mut::new(vec!["alice"]);
let view = roster.read();
let _guard = view.subscribe(|names: Vec<&str>| println!("render {names:?}"));
roster.update(|names| names.push("bob"));
assert_eq!(view.get(), vec!["alice", "bob"]);
```
*/

pub mod broadcast;
pub mod porcelain;
pub mod signal;
pub mod value;

pub use broadcast::{Broadcast, BroadcastId, BroadcastListener, IntoBroadcastListener, ListenerGuard};
pub use porcelain::*;
pub use signal::*;
