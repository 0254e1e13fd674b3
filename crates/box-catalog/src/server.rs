//! Where the catalog lives

use serde::{Deserialize, Serialize};

/// Directory on the server that holds one subdirectory per box
pub const DEFAULT_BOXES_DIR: &str = "/var/www/vagrant_boxes";
/// URL path the web server exposes the boxes directory under
pub const DEFAULT_URL_PATH: &str = "vagrant_boxes";
/// Name of the metadata document inside each box directory
pub const METADATA_FILE: &str = "metadata.json";

/// A catalog server reachable over ssh and served over http
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogServer {
    /// Host name, used for both ssh and http
    pub domain: String,
    /// Login user for ssh and scp
    pub user: String,
    /// Boxes directory on the server
    #[serde(default = "default_boxes_dir")]
    pub boxes_dir: String,
    /// URL path of the boxes directory
    #[serde(default = "default_url_path")]
    pub url_path: String,
}

fn default_boxes_dir() -> String {
    DEFAULT_BOXES_DIR.to_string()
}

fn default_url_path() -> String {
    DEFAULT_URL_PATH.to_string()
}

impl CatalogServer {
    /// A server using the default directory layout
    pub fn new(domain: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            user: user.into(),
            boxes_dir: default_boxes_dir(),
            url_path: default_url_path(),
        }
    }

    /// `user@domain`, as ssh and scp expect it
    pub fn login(&self) -> String {
        format!("{}@{}", self.user, self.domain)
    }

    /// Directory on the server for one box
    pub fn box_dir(&self, box_name: &str) -> String {
        format!("{}/{}", self.boxes_dir.trim_end_matches('/'), box_name)
    }

    /// Path on the server of a box's metadata document
    pub fn metadata_path(&self, box_name: &str) -> String {
        format!("{}/{}", self.box_dir(box_name), METADATA_FILE)
    }

    /// Base URL everything under the boxes directory is served from
    pub fn base_url(&self) -> String {
        format!("http://{}/{}", self.domain, self.url_path.trim_matches('/'))
    }

    /// URL Vagrant reads a box's metadata from
    pub fn metadata_url(&self, box_name: &str) -> String {
        format!("{}/{}/{}", self.base_url(), box_name, METADATA_FILE)
    }

    /// URL of a file given relative to the boxes directory
    pub fn file_url(&self, relative_path: &str) -> String {
        format!("{}/{}", self.base_url(), relative_path.trim_start_matches('/'))
    }
}
