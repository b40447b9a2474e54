use crate::layout::{RouteKind, RouteSet};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct RouteDump {
    pub routes: BTreeMap<String, RouteEntry>,
}

#[derive(Debug, Serialize)]
pub struct RouteEntry {
    pub kind: RouteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    pub points: Vec<[f32; 2]>,
    pub path: String,
}

impl RouteDump {
    pub fn from_routes(routes: &RouteSet) -> Self {
        let routes = routes
            .iter()
            .map(|(key, route)| {
                (
                    key.clone(),
                    RouteEntry {
                        kind: route.kind,
                        style: route.style.clone(),
                        points: route.points.iter().map(|p| [p.x, p.y]).collect(),
                        path: route.path_data(),
                    },
                )
            })
            .collect();
        Self { routes }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_route_dump(path: Option<&Path>, dump: &RouteDump) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, dump)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}
