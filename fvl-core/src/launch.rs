// fvl-core/src/launch.rs
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;

use fvl_common::platform::PlatformTarget;
use tracing::debug;

/// Fully-built invocation of the view: program, arguments and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: OsString,
    args: Vec<OsString>,
    envs: HashMap<OsString, OsString>,
}

/// Per-launch inputs to [`LaunchCommand::build`].
#[derive(Debug, Clone, Copy)]
pub struct LaunchParams<'a> {
    pub page_url: &'a str,
    pub token_path: &'a Path,
    pub assets_dir: Option<&'a Path>,
    pub hidden: bool,
    /// Variable set to `true` when `hidden` is requested.
    pub hide_window_var: &'a str,
}

impl LaunchCommand {
    /// Windows and Linux run the executable directly. macOS goes through
    /// `open -n -W --args`, which starts a fresh instance of the bundle and
    /// waits for it to exit.
    pub fn build(
        platform: &PlatformTarget,
        bundle: &Path,
        params: &LaunchParams<'_>,
        base_env: impl IntoIterator<Item = (OsString, OsString)>,
    ) -> Self {
        let (program, mut args) = match platform {
            PlatformTarget::MacOs => (
                OsString::from("open"),
                vec![
                    bundle.as_os_str().to_os_string(),
                    OsString::from("-n"),
                    OsString::from("-W"),
                    OsString::from("--args"),
                ],
            ),
            PlatformTarget::Windows | PlatformTarget::Linux(_) => {
                (bundle.as_os_str().to_os_string(), Vec::new())
            }
        };
        args.push(OsString::from(params.page_url));
        args.push(params.token_path.as_os_str().to_os_string());
        if let Some(assets) = params.assets_dir {
            args.push(assets.as_os_str().to_os_string());
        }

        let mut envs: HashMap<OsString, OsString> = base_env.into_iter().collect();
        if params.hidden {
            envs.insert(
                OsString::from(params.hide_window_var),
                OsString::from("true"),
            );
        }

        let command = Self {
            program,
            args,
            envs,
        };
        debug!("Launch argv: {:?}", command.argv());
        command
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn envs(&self) -> &HashMap<OsString, OsString> {
        &self.envs
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use fvl_common::platform::LinuxArch;

    use super::*;

    fn os(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    fn params<'a>(token: &'a Path, assets: Option<&'a Path>, hidden: bool) -> LaunchParams<'a> {
        LaunchParams {
            page_url: "http://127.0.0.1:8550",
            token_path: token,
            assets_dir: assets,
            hidden,
            hide_window_var: "FLET_HIDE_WINDOW_ON_START",
        }
    }

    #[test]
    fn macos_goes_through_open() {
        let token = PathBuf::from("/tmp/abc");
        let cmd = LaunchCommand::build(
            &PlatformTarget::MacOs,
            Path::new("/Users/me/.flet/bin/flet-0.25.2/Flet.app"),
            &params(&token, None, false),
            Vec::new(),
        );
        assert_eq!(
            cmd.argv(),
            os(&[
                "open",
                "/Users/me/.flet/bin/flet-0.25.2/Flet.app",
                "-n",
                "-W",
                "--args",
                "http://127.0.0.1:8550",
                "/tmp/abc",
            ])
        );
    }

    #[test]
    fn macos_appends_assets_dir() {
        let token = PathBuf::from("/tmp/abc");
        let assets = PathBuf::from("/srv/assets");
        let cmd = LaunchCommand::build(
            &PlatformTarget::MacOs,
            Path::new("/b/Flet.app"),
            &params(&token, Some(&assets), false),
            Vec::new(),
        );
        assert_eq!(
            cmd.argv(),
            os(&[
                "open",
                "/b/Flet.app",
                "-n",
                "-W",
                "--args",
                "http://127.0.0.1:8550",
                "/tmp/abc",
                "/srv/assets",
            ])
        );
    }

    #[test]
    fn direct_executables_on_windows_and_linux() {
        let token = PathBuf::from("/tmp/abc");
        for platform in [
            PlatformTarget::Windows,
            PlatformTarget::Linux(LinuxArch::Amd64),
        ] {
            let cmd = LaunchCommand::build(
                &platform,
                Path::new("/opt/flet/flet"),
                &params(&token, None, false),
                Vec::new(),
            );
            assert_eq!(cmd.program(), &OsString::from("/opt/flet/flet"));
            assert_eq!(cmd.args(), os(&["http://127.0.0.1:8550", "/tmp/abc"]).as_slice());
        }
    }

    #[test]
    fn hidden_adds_flag_on_top_of_base_env() {
        let token = PathBuf::from("/tmp/abc");
        let base = vec![(OsString::from("PATH"), OsString::from("/usr/bin"))];
        let cmd = LaunchCommand::build(
            &PlatformTarget::Linux(LinuxArch::Amd64),
            Path::new("/opt/flet/flet"),
            &params(&token, None, true),
            base,
        );
        assert_eq!(
            cmd.envs().get(&OsString::from("FLET_HIDE_WINDOW_ON_START")),
            Some(&OsString::from("true"))
        );
        assert_eq!(
            cmd.envs().get(&OsString::from("PATH")),
            Some(&OsString::from("/usr/bin"))
        );
    }

    #[test]
    fn visible_leaves_env_untouched() {
        let token = PathBuf::from("/tmp/abc");
        let cmd = LaunchCommand::build(
            &PlatformTarget::Windows,
            Path::new("C:/flet/flet.exe"),
            &params(&token, None, false),
            Vec::new(),
        );
        assert!(cmd.envs().is_empty());
    }
}
