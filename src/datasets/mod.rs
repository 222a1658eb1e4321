//! Dataset readers
//!
//! Each reader lists the dated raw root of one dataset, parses every JSON
//! file into a partition and applies that dataset's projection:
//!
//! | Dataset         | Layout       | Projection                                   |
//! |-----------------|--------------|----------------------------------------------|
//! | `titles`        | `*.json`     | explode `titleListMap.<WEEKDAY>`, tag weekday |
//! | `title_info`    | `*.json`     | none                                         |
//! | `episodes`      | `*/*.json`   | explode `articleList`, keep `title_id`       |
//! | `episode_likes` | `*/*.json`   | none                                         |
//! | `comments`      | `*/*.json`   | none                                         |

mod readers;

pub use readers::{
    get_comments, get_episode_likes, get_episodes, get_title_info, get_titles, project_episodes,
    project_titles, read_dataset, read_json,
};
