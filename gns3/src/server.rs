// DcNet: Multi-Tenant Data Center Network Emulation
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # GNS3 Server

use crate::types::*;
use crate::{Error, Result};

use isahc::prelude::*;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// # GNS3 Server Handle
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, PartialEq, Clone)]
pub struct GNS3Server {
    address: String,
    version: String,
    project: Option<String>,
}

impl GNS3Server {
    /// Create a new instance of a server handler
    pub fn new(address: impl AsRef<str>, port: u32) -> Result<Self> {
        let address = format!("http://{}:{}", address.as_ref(), port);
        let version_addr = format!("{}/v2/version", address);
        let v: GNS3ResponseVersion = serde_json::from_str(&isahc::get(&version_addr)?.text()?)?;
        Ok(Self { address, version: v.version, project: None })
    }

    /// Get the version
    pub fn version(&self) -> &str {
        self.version.as_ref()
    }

    /// ID of the opened project
    pub fn project_id(&self) -> Result<&str> {
        self.project.as_deref().ok_or(Error::NoProjectOpened)
    }

    /// Returns all project informations
    pub fn get_projects(&self) -> Result<Vec<GNS3Project>> {
        self.request(Method::Get, "projects", None)
    }

    /// Opens a project, and returns the new information
    pub fn open_project(&mut self, project_id: impl AsRef<str>) -> Result<GNS3Project> {
        let key = format!("projects/{}", project_id.as_ref());
        let result = self.request::<GNS3Project>(Method::Get, &key, None).and_then(|info| {
            if info.status == GNS3ProjectStatus::Closed {
                self.request(Method::Post, format!("{}/open", key), Some(json!({})))
            } else {
                Ok(info)
            }
        });
        self.project = result.as_ref().ok().map(|info| info.id.clone());
        result
    }

    /// Closes the opened project, and returns the new information
    pub fn close_project(&mut self) -> Result<GNS3Project> {
        let project_id: String = self.project.take().ok_or(Error::NoProjectOpened)?;
        let key = format!("projects/{}", project_id);
        let info: GNS3Project = self.request(Method::Get, &key, None)?;
        if info.status == GNS3ProjectStatus::Opened {
            self.request_raw(Method::Post, format!("{}/close", key), Some(json!({})))?;
        }
        self.request(Method::Get, &key, None)
    }

    /// Create a new project with the given name, and open it
    pub fn create_project(&mut self, project_name: impl AsRef<str>) -> Result<GNS3Project> {
        let project: GNS3Project =
            self.request(Method::Post, "projects", Some(json!({ "name": project_name.as_ref() })))?;
        self.project = Some(project.id.clone());
        Ok(project)
    }

    /// Delete an existing project
    pub fn delete_project(&mut self, project_id: impl AsRef<str>) -> Result<()> {
        if self.project.as_deref() == Some(project_id.as_ref()) {
            self.project = None;
        }
        self.request_delete(format!("projects/{}", project_id.as_ref()))
    }

    /// Returns all available templates
    pub fn get_templates(&self) -> Result<Vec<GNS3Template>> {
        self.request(Method::Get, "templates", None)
    }

    /// Returns the template with the given name
    pub fn find_template(&self, name: impl AsRef<str>) -> Result<Option<GNS3Template>> {
        Ok(self.get_templates()?.into_iter().find(|t| t.name == name.as_ref()))
    }

    /// Create a new node from a template
    pub fn create_node(
        &self,
        name: impl AsRef<str>,
        template_id: impl AsRef<str>,
    ) -> Result<GNS3Node> {
        let key = format!("projects/{}/templates/{}", self.project_id()?, template_id.as_ref());
        let body = json!({ "name": name.as_ref(), "x": 0, "y": 0 });
        let node: GNS3Node = self.request(Method::Post, key, Some(body))?;
        // the server may add a suffix to the name of the template
        self.rename_node(node.id, name)
    }

    /// Create a new docker container on the local compute, with the given number of adapters.
    pub fn create_docker_node(
        &self,
        name: impl AsRef<str>,
        image: impl AsRef<str>,
        adapters: u32,
    ) -> Result<GNS3Node> {
        let key = format!("projects/{}/nodes", self.project_id()?);
        let body = json!({
            "name": name.as_ref(),
            "node_type": "docker",
            "compute_id": "local",
            "x": 0,
            "y": 0,
            "properties": { "image": image.as_ref(), "adapters": adapters },
        });
        self.request(Method::Post, key, Some(body))
    }

    /// Change the name of a node
    pub fn rename_node(
        &self,
        node_id: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> Result<GNS3Node> {
        let key = format!("projects/{}/nodes/{}", self.project_id()?, node_id.as_ref());
        self.request(Method::Put, key, Some(json!({ "name": name.as_ref() })))
    }

    /// Delete a node, together with all its links
    pub fn delete_node(&self, node_id: impl AsRef<str>) -> Result<()> {
        self.request_delete(format!("projects/{}/nodes/{}", self.project_id()?, node_id.as_ref()))
    }

    /// Return all nodes in the project
    pub fn get_nodes(&self) -> Result<Vec<GNS3Node>> {
        self.request(Method::Get, format!("projects/{}/nodes", self.project_id()?), None)
    }

    /// Create a new link. The interface is used as an index into the interfaces of the
    /// corresponding node.
    pub fn create_link(
        &self,
        node_a: &GNS3Node,
        iface_a: usize,
        node_b: &GNS3Node,
        iface_b: usize,
    ) -> Result<GNS3Link> {
        let endpoint_a = GNS3LinkEndpoint::from_node(node_a, iface_a)
            .ok_or_else(|| Error::NoSuchInterface(node_a.name.clone(), iface_a))?;
        let endpoint_b = GNS3LinkEndpoint::from_node(node_b, iface_b)
            .ok_or_else(|| Error::NoSuchInterface(node_b.name.clone(), iface_b))?;
        let key = format!("projects/{}/links", self.project_id()?);
        self.request(Method::Post, key, Some(json!({ "nodes": [endpoint_a, endpoint_b] })))
    }

    /// Delay all packets on the link by the given amount of milliseconds.
    pub fn set_link_delay(&self, link_id: impl AsRef<str>, delay_ms: u32) -> Result<GNS3Link> {
        let key = format!("projects/{}/links/{}", self.project_id()?, link_id.as_ref());
        self.request(Method::Put, key, Some(json!({ "filters": { "delay": [delay_ms, 0] } })))
    }

    /// Return all links in the project
    pub fn get_links(&self) -> Result<Vec<GNS3Link>> {
        self.request(Method::Get, format!("projects/{}/links", self.project_id()?), None)
    }

    /// Start all nodes in the project
    pub fn start_all_nodes(&self) -> Result<()> {
        let key = format!("projects/{}/nodes/start", self.project_id()?);
        self.request_raw(Method::Post, key, Some(json!({}))).map(|_| ())
    }

    /// Stop all nodes in the project
    pub fn stop_all_nodes(&self) -> Result<()> {
        let key = format!("projects/{}/nodes/stop", self.project_id()?);
        self.request_raw(Method::Post, key, Some(json!({}))).map(|_| ())
    }

    /// Start a specific node
    pub fn start_node(&self, node_id: impl AsRef<str>) -> Result<GNS3Node> {
        let key = format!("projects/{}/nodes/{}/start", self.project_id()?, node_id.as_ref());
        self.request(Method::Post, key, Some(json!({})))
    }

    /// Stop a specific node
    pub fn stop_node(&self, node_id: impl AsRef<str>) -> Result<GNS3Node> {
        let key = format!("projects/{}/nodes/{}/stop", self.project_id()?, node_id.as_ref());
        self.request(Method::Post, key, Some(json!({})))
    }

    fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        key: impl AsRef<str>,
        body: Option<Value>,
    ) -> Result<T> {
        Ok(serde_json::from_str(&self.request_raw(method, key, body)?)?)
    }

    fn request_raw(
        &self,
        method: Method,
        key: impl AsRef<str>,
        body: Option<Value>,
    ) -> Result<String> {
        let addr = format!("{}/v2/{}", self.address, key.as_ref());
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let response = match method {
            Method::Get => isahc::get(&addr)?,
            Method::Post => isahc::post(&addr, body)?,
            Method::Put => isahc::put(&addr, body)?,
            Method::Delete => isahc::delete(&addr)?,
        };
        self.handle_response(response)
    }

    fn request_delete(&self, key: impl AsRef<str>) -> Result<()> {
        match self.request_raw(Method::Delete, key, None) {
            Ok(_) => Ok(()),
            Err(Error::GNS3Error { id, .. }) if (200..300).contains(&id) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn handle_response(&self, mut response: Response<Body>) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ResponseError(status.as_u16(), response.text()?));
        }
        let response = response.text()?;
        let error_re = Regex::new(r"^(\d+): (.*)$").unwrap();
        match error_re.captures(&response) {
            Some(captures) => Err(Error::GNS3Error {
                id: captures[1].parse().unwrap_or_default(),
                message: captures[2].to_string(),
            }),
            None => Ok(response),
        }
    }
}
