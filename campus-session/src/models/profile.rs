use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{deserialize_id, deserialize_optional_id, UserId};

/// Field names that look like credentials and must never be kept or cached.
const CREDENTIAL_MARKERS: &[&str] = &[
    "password",
    "contrasena",
    "contraseña",
    "clave",
    "hash",
    "secret",
    "token",
];

/// Fields with a dedicated slot on [`UserProfile`]; they never land in `extra`.
const KNOWN_FIELDS: &[&str] = &[
    "id_usuario",
    "nombres_usuario",
    "apellidos_usuario",
    "correo",
    "id_rol",
    "id_carrera",
    "id_tipo_carrera",
    "nombre_carrera",
];

fn is_credential_field(key: &str) -> bool {
    let lowered = key.to_lowercase();
    CREDENTIAL_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Full user profile as returned by `GET /api/usuarios/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "deserialize_id")]
    pub id_usuario: UserId,
    #[serde(default)]
    pub nombres_usuario: String,
    #[serde(default)]
    pub apellidos_usuario: String,
    #[serde(default)]
    pub correo: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id_rol: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id_carrera: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id_tipo_carrera: Option<i64>,
    #[serde(default)]
    pub nombre_carrera: Option<String>,
    /// Remaining backend fields, passed through to the dashboard as-is.
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Drop credential-like fields the backend may have included.
    pub fn normalized(mut self) -> Self {
        self.extra.retain(|key, _| !is_credential_field(key));
        self
    }

    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.nombres_usuario.trim(),
            self.apellidos_usuario.trim()
        );
        let full = full.trim();
        if full.is_empty() {
            self.correo.split('@').next().unwrap_or("Usuario").to_string()
        } else {
            full.to_string()
        }
    }

    pub fn initials(&self) -> String {
        let initials: String = [&self.nombres_usuario, &self.apellidos_usuario]
            .iter()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(|c| c.to_uppercase())
            .collect();

        if !initials.is_empty() {
            return initials;
        }
        self.correo
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }

    pub fn projection(&self) -> CachedProfile {
        CachedProfile::from(self)
    }
}

/// Reduced profile persisted under `userData` for quick reloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProfile {
    pub id_usuario: UserId,
    pub nombres_usuario: String,
    pub apellidos_usuario: String,
    pub correo: String,
    pub id_rol: Option<i64>,
}

impl From<&UserProfile> for CachedProfile {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id_usuario: profile.id_usuario,
            nombres_usuario: profile.nombres_usuario.clone(),
            apellidos_usuario: profile.apellidos_usuario.clone(),
            correo: profile.correo.clone(),
            id_rol: profile.id_rol,
        }
    }
}

/// Partial profile update, merged field by field into the current profile.
///
/// The user id is not patchable; switching users goes through a fresh load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombres_usuario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellidos_usuario: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_rol: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_carrera: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_tipo_carrera: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_carrera: Option<String>,
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.nombres_usuario.is_none()
            && self.apellidos_usuario.is_none()
            && self.correo.is_none()
            && self.id_rol.is_none()
            && self.id_carrera.is_none()
            && self.id_tipo_carrera.is_none()
            && self.nombre_carrera.is_none()
            && self.extra.is_empty()
    }

    /// Shallow merge: every field present in the patch replaces the profile's.
    pub fn apply_to(self, profile: &mut UserProfile) {
        if let Some(nombres) = self.nombres_usuario {
            profile.nombres_usuario = nombres;
        }
        if let Some(apellidos) = self.apellidos_usuario {
            profile.apellidos_usuario = apellidos;
        }
        if let Some(correo) = self.correo {
            profile.correo = correo;
        }
        if let Some(id_rol) = self.id_rol {
            profile.id_rol = Some(id_rol);
        }
        if let Some(id_carrera) = self.id_carrera {
            profile.id_carrera = Some(id_carrera);
        }
        if let Some(id_tipo_carrera) = self.id_tipo_carrera {
            profile.id_tipo_carrera = Some(id_tipo_carrera);
        }
        if let Some(nombre_carrera) = self.nombre_carrera {
            profile.nombre_carrera = Some(nombre_carrera);
        }
        for (key, value) in self.extra {
            if KNOWN_FIELDS.contains(&key.as_str()) || is_credential_field(&key) {
                continue;
            }
            profile.extra.insert(key, value);
        }
    }
}
