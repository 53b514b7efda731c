//! Branching narrative graph
//!
//! Rooms walk this graph between battles. The graph is data only; reward
//! application and progression rules live on the room session.

mod definition;
mod loader;

pub use definition::{Chapter, DialogueLine, Reward, StoryBuff, StoryNode, StoryOption};
pub use loader::Story;
