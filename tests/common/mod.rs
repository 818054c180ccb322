//! Fixture files shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use robocompdsl_core::{DslFactory, ModulePool, PoolConfig};
use tempfile::TempDir;

pub const COMMON_BEHAVIOR: &str = r#"
module RoboCompCommonBehavior
{
    enum State { Starting, Running };
    struct Parameter { bool editable; string value; string type; };
    dictionary<string, Parameter> ParameterList;

    interface CommonBehavior
    {
        int getPeriod();
        void setPeriod(int period);
        State getState();
        ParameterList getParameterList();
    };
};
"#;

pub const GENERIC_BASE: &str = r#"
module RoboCompGenericBase
{
    exception HardwareFailedException { string what; };
    struct TBaseState { float x; float z; float alpha; bool isMoving; };

    interface GenericBase
    {
        void getBaseState(out TBaseState state) throws HardwareFailedException;
    };
};
"#;

pub const DIFFERENTIAL_ROBOT: &str = r#"
import "GenericBase.idsl";

module RoboCompDifferentialRobot
{
    interface DifferentialRobot
    {
        void getBaseState(out RoboCompGenericBase::TBaseState state) throws RoboCompGenericBase::HardwareFailedException;
        void setSpeedBase(float adv, float rot);
        void stopBase();
    };
};
"#;

pub const LASER: &str = r#"
import "GenericBase.idsl";

module RoboCompLaser
{
    struct TData { float angle; float dist; };
    sequence<TData> TLaserData;

    interface Laser
    {
        TLaserData getLaserData();
        TLaserData getLaserAndBStateData(out RoboCompGenericBase::TBaseState bState);
    };
};
"#;

pub const JOYSTICK_ADAPTER: &str = r#"
module RoboCompJoystickAdapter
{
    struct AxisParams { string name; float value; };
    sequence<AxisParams> AxisList;
    struct TData { string id; AxisList axes; };

    interface JoystickAdapter
    {
        void sendData(TData data);
    };
};
"#;

pub const STATEMACHINE: &str = r#"
/* follower machine */
follower_machine{
    states follow, stop;
    initial_state init;
    end_state finish;
    transitions{
        init => follow;
        follow => follow, stop;
        stop => follow, finish;
    };
};

:follow parallel{
    states scan, drive;
    initial_state plan;
};
"#;

pub const COMPONENT: &str = r#"
import "DifferentialRobot.idsl";
import "Laser.idsl";
import "JoystickAdapter.idsl";

Component follower
{
    Communications
    {
        requires Laser, DifferentialRobot;
        subscribesTo JoystickAdapter;
    };
    language Cpp11;
    gui Qt(QWidget);
    statemachine "machines/follower.smdsl";
};
"#;

/// Interface directory and component directory inside one temp dir.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = Self { dir };
        fs::create_dir_all(fixture.interfaces()).unwrap();
        fs::create_dir_all(fixture.component_dir().join("machines")).unwrap();
        fixture.write_interface("CommonBehavior.idsl", COMMON_BEHAVIOR);
        fixture.write_interface("GenericBase.idsl", GENERIC_BASE);
        fixture.write_interface("DifferentialRobot.idsl", DIFFERENTIAL_ROBOT);
        fixture.write_interface("Laser.idsl", LASER);
        fixture.write_interface("JoystickAdapter.idsl", JOYSTICK_ADAPTER);
        fixture.write_component("machines/follower.smdsl", STATEMACHINE);
        fixture.write_component("follower.cdsl", COMPONENT);
        fixture
    }

    pub fn interfaces(&self) -> PathBuf {
        self.dir.path().join("interfaces")
    }

    pub fn component_dir(&self) -> PathBuf {
        self.dir.path().join("component")
    }

    pub fn write_interface(&self, name: &str, content: &str) -> PathBuf {
        write(&self.interfaces().join(name), content)
    }

    pub fn write_component(&self, name: &str, content: &str) -> PathBuf {
        write(&self.component_dir().join(name), content)
    }

    pub fn config(&self) -> PoolConfig {
        PoolConfig::isolated([self.interfaces()]).with_mandatory_modules(["CommonBehavior.idsl"])
    }

    pub fn factory(&self) -> DslFactory {
        DslFactory::new(Arc::new(ModulePool::new(self.config())))
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    fs::write(path, content).unwrap();
    path.to_path_buf()
}
